//! Prover and verifier views of the Fiat-Shamir transcript.
//!
//! Both wrap a [`TranscriptEngineTrait`] hash chain that starts from the construction label
//! `"UltraHonk"` and immediately absorbs the verification key digest. The prover records
//! every message it sends; the verifier consumes the same messages from a [`Proof`] in the
//! same order and with the same labels, so both sides derive identical challenges.
use crate::{
  Commitment,
  digest::HonkDigest,
  errors::HonkError,
  proof::{Proof, ProofElement, ProofEntry},
  traits::{Engine, transcript::TranscriptEngineTrait},
};

/// Construction label of every UltraHonk transcript
pub const TRANSCRIPT_LABEL: &[u8] = b"UltraHonk";

fn seeded_engine<E: Engine>(vk_digest: &HonkDigest) -> E::TE {
  let mut engine = E::TE::new(TRANSCRIPT_LABEL);
  engine.absorb(b"vk", vk_digest);
  engine
}

/// The prover side: absorbs and records messages, derives challenges
pub struct ProverTranscript<E: Engine> {
  engine: E::TE,
  entries: Vec<ProofEntry<E>>,
}

impl<E: Engine> ProverTranscript<E> {
  /// Starts a transcript bound to the given verification key digest
  pub fn new(vk_digest: &HonkDigest) -> Self {
    Self {
      engine: seeded_engine::<E>(vk_digest),
      entries: Vec::new(),
    }
  }

  /// Appends a message to the transcript and to the proof
  pub fn send_to_verifier(&mut self, label: impl Into<String>, element: ProofElement<E>) {
    let label = label.into();
    self.engine.absorb(label.as_bytes(), &element);
    self.entries.push(ProofEntry { label, element });
  }

  /// Derives one challenge
  pub fn get_challenge(&mut self, label: &str) -> Result<E::Scalar, HonkError> {
    self.engine.squeeze(label.as_bytes())
  }

  /// Derives several challenges from the same transcript state
  pub fn get_challenges(&mut self, labels: &[&str]) -> Result<Vec<E::Scalar>, HonkError> {
    let labels = labels.iter().map(|l| l.as_bytes()).collect::<Vec<_>>();
    self.engine.squeeze_many(&labels)
  }

  /// Number of messages sent so far
  pub fn num_entries(&self) -> usize {
    self.entries.len()
  }

  /// The recorded messages
  pub fn entries(&self) -> &[ProofEntry<E>] {
    &self.entries
  }

  pub(crate) fn engine_mut(&mut self) -> &mut E::TE {
    &mut self.engine
  }

  pub(crate) fn take_entries(&mut self) -> Vec<ProofEntry<E>> {
    std::mem::take(&mut self.entries)
  }
}

/// The verifier side: replays the prover's messages from a proof
pub struct VerifierTranscript<'a, E: Engine> {
  engine: E::TE,
  entries: &'a [ProofEntry<E>],
  cursor: usize,
}

impl<'a, E: Engine> VerifierTranscript<'a, E> {
  /// Starts a transcript bound to the given verification key digest, reading from `proof`
  pub fn new(vk_digest: &HonkDigest, proof: &'a Proof<E>) -> Self {
    Self {
      engine: seeded_engine::<E>(vk_digest),
      entries: proof.entries(),
      cursor: 0,
    }
  }

  fn receive(&mut self, label: &str) -> Result<&'a ProofElement<E>, HonkError> {
    let entry = self
      .entries
      .get(self.cursor)
      .ok_or_else(|| HonkError::ProofVerifyError {
        reason: format!("proof ended before {label}"),
      })?;
    if entry.label != label {
      return Err(HonkError::ProofVerifyError {
        reason: format!("expected {label}, found {}", entry.label),
      });
    }
    self.cursor += 1;
    self.engine.absorb(label.as_bytes(), &entry.element);
    Ok(&entry.element)
  }

  fn mismatch(label: &str, expected: &str, found: &ProofElement<E>) -> HonkError {
    HonkError::ProofVerifyError {
      reason: format!("{label}: expected {expected}, found {}", found.kind()),
    }
  }

  /// Reads an index message
  pub fn receive_index(&mut self, label: &str) -> Result<u64, HonkError> {
    match self.receive(label)? {
      ProofElement::Index(i) => Ok(*i),
      other => Err(Self::mismatch(label, "index", other)),
    }
  }

  /// Reads a scalar message
  pub fn receive_scalar(&mut self, label: &str) -> Result<E::Scalar, HonkError> {
    match self.receive(label)? {
      ProofElement::Scalar(s) => Ok(*s),
      other => Err(Self::mismatch(label, "scalar", other)),
    }
  }

  /// Reads a vector of exactly `len` scalars
  pub fn receive_scalars(&mut self, label: &str, len: usize) -> Result<Vec<E::Scalar>, HonkError> {
    match self.receive(label)? {
      ProofElement::Scalars(v) if v.len() == len => Ok(v.clone()),
      ProofElement::Scalars(v) => Err(HonkError::ProofVerifyError {
        reason: format!("{label}: expected {len} scalars, found {}", v.len()),
      }),
      other => Err(Self::mismatch(label, "scalars", other)),
    }
  }

  /// Reads a commitment message
  pub fn receive_commitment(&mut self, label: &str) -> Result<Commitment<E>, HonkError> {
    match self.receive(label)? {
      ProofElement::Commitment(c) => Ok(c.clone()),
      other => Err(Self::mismatch(label, "commitment", other)),
    }
  }

  /// Derives one challenge
  pub fn get_challenge(&mut self, label: &str) -> Result<E::Scalar, HonkError> {
    self.engine.squeeze(label.as_bytes())
  }

  /// Derives several challenges from the same transcript state
  pub fn get_challenges(&mut self, labels: &[&str]) -> Result<Vec<E::Scalar>, HonkError> {
    let labels = labels.iter().map(|l| l.as_bytes()).collect::<Vec<_>>();
    self.engine.squeeze_many(&labels)
  }

  /// Fails unless every message of the proof was consumed
  pub fn finish(&self) -> Result<(), HonkError> {
    if self.cursor == self.entries.len() {
      Ok(())
    } else {
      Err(HonkError::ProofVerifyError {
        reason: format!("{} unread proof entries", self.entries.len() - self.cursor),
      })
    }
  }

  pub(crate) fn engine_mut(&mut self) -> &mut E::TE {
    &mut self.engine
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{provider::Bn256EngineKZG, traits::pcs::PCSEngineTrait};
  use ff::Field;

  type E = Bn256EngineKZG;
  type F = <E as Engine>::Scalar;

  fn sample_proof(entries: Vec<ProofEntry<E>>) -> Proof<E> {
    let (ck, _) = <E as Engine>::PCS::setup(b"transcript", 4);
    let mut engine = <E as Engine>::TE::new(b"opening");
    let (_, opening) =
      <E as Engine>::PCS::prove(&ck, &mut engine, &[F::ONE, F::ONE], &F::from(2u64)).unwrap();
    Proof { entries, opening }
  }

  #[test]
  fn test_prover_and_verifier_agree() {
    let digest = [3u8; 32];
    let mut pt = ProverTranscript::<E>::new(&digest);
    pt.send_to_verifier("circuit_size", ProofElement::Index(8));
    pt.send_to_verifier("x", ProofElement::Scalar(F::from(5u64)));
    let c1 = pt.get_challenge("eta").unwrap();
    pt.send_to_verifier("v", ProofElement::Scalars(vec![F::ONE, F::ZERO]));
    let c2 = pt.get_challenges(&["beta", "gamma"]).unwrap();

    let proof = sample_proof(pt.take_entries());
    let mut vt = VerifierTranscript::<E>::new(&digest, &proof);
    assert_eq!(vt.receive_index("circuit_size").unwrap(), 8);
    assert_eq!(vt.receive_scalar("x").unwrap(), F::from(5u64));
    assert_eq!(vt.get_challenge("eta").unwrap(), c1);
    assert_eq!(vt.receive_scalars("v", 2).unwrap().len(), 2);
    assert_eq!(vt.get_challenges(&["beta", "gamma"]).unwrap(), c2);
    assert!(vt.finish().is_ok());
  }

  #[test]
  fn test_digest_binds_challenges() {
    let mut a = ProverTranscript::<E>::new(&[1u8; 32]);
    let mut b = ProverTranscript::<E>::new(&[2u8; 32]);
    assert_ne!(a.get_challenge("c").unwrap(), b.get_challenge("c").unwrap());
  }

  #[test]
  fn test_verifier_rejects_label_and_kind_mismatch() {
    let digest = [0u8; 32];
    let proof = sample_proof(vec![ProofEntry {
      label: "W_1".to_string(),
      element: ProofElement::Scalar(F::ONE),
    }]);

    let mut vt = VerifierTranscript::<E>::new(&digest, &proof);
    assert!(matches!(
      vt.receive_scalar("W_2"),
      Err(HonkError::ProofVerifyError { .. })
    ));

    let mut vt = VerifierTranscript::<E>::new(&digest, &proof);
    assert!(matches!(
      vt.receive_commitment("W_1"),
      Err(HonkError::ProofVerifyError { .. })
    ));

    let vt = VerifierTranscript::<E>::new(&digest, &proof);
    assert!(vt.finish().is_err());
  }

  #[test]
  fn test_repeated_challenge_is_misuse() {
    let mut pt = ProverTranscript::<E>::new(&[0u8; 32]);
    pt.get_challenge("a").unwrap();
    for _ in 0..2 {
      assert!(matches!(
        pt.get_challenge("b"),
        Err(HonkError::TranscriptMisuse { .. })
      ));
    }
  }
}
