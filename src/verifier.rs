//! The UltraHonk verifier.
//!
//! Replays the prover's transcript from the proof, re-deriving every challenge, then checks
//! the relation check, reduces the claimed evaluations through Gemini and Shplonk to a single
//! univariate claim and verifies its opening.
use crate::{
  Commitment,
  composer::VerificationKey,
  errors::HonkError,
  flavor::{Entity, NUM_UNSHIFTED_ENTITIES},
  opening::{gemini::GeminiVerifier, shplonk::ShplonkVerifier},
  proof::Proof,
  relations::{RelationParameters, compute_lookup_grand_product_delta, compute_public_input_delta},
  start_span,
  sumcheck::SumcheckVerifier,
  traits::{Engine, pcs::PCSEngineTrait, transcript::powers},
  transcript::VerifierTranscript,
};
use std::{collections::HashMap, sync::Arc, time::Instant};
use tracing::{info, info_span};

/// Verifies proofs against one verification key
pub struct UltraVerifier<E: Engine> {
  vk: Arc<VerificationKey<E>>,
}

impl<E: Engine> UltraVerifier<E> {
  /// Creates a verifier for `vk`
  pub fn new(vk: Arc<VerificationKey<E>>) -> Self {
    Self { vk }
  }

  fn expect_index(
    transcript: &mut VerifierTranscript<'_, E>,
    label: &str,
    expected: usize,
  ) -> Result<(), HonkError> {
    let found = transcript.receive_index(label)?;
    if found != expected as u64 {
      return Err(HonkError::ProofVerifyError {
        reason: format!("{label}: expected {expected}, found {found}"),
      });
    }
    Ok(())
  }

  /// Checks `proof` for the given public inputs
  pub fn verify(&self, public_inputs: &[E::Scalar], proof: &Proof<E>) -> Result<(), HonkError> {
    let (_verify_span, verify_t) = start_span!("ultra_verify");
    let vk = &self.vk;
    let n = vk.circuit_size;
    let d = vk.log_circuit_size;
    if public_inputs.len() != vk.num_public_inputs {
      return Err(HonkError::InvalidInputLength);
    }

    let mut transcript = VerifierTranscript::new(&vk.digest()?, proof);
    Self::expect_index(&mut transcript, "circuit_size", n)?;
    Self::expect_index(&mut transcript, "public_input_size", vk.num_public_inputs)?;
    Self::expect_index(&mut transcript, "pub_inputs_offset", vk.pub_inputs_offset)?;
    for (i, x) in public_inputs.iter().enumerate() {
      if transcript.receive_scalar(&format!("public_input_{i}"))? != *x {
        return Err(HonkError::ProofVerifyError {
          reason: format!("public input {i} does not match"),
        });
      }
    }

    let mut commitments: HashMap<Entity, Commitment<E>> = Entity::PRECOMPUTED
      .iter()
      .copied()
      .zip(vk.commitments.iter().cloned())
      .collect();
    let mut receive = |transcript: &mut VerifierTranscript<'_, E>, e: Entity| {
      transcript
        .receive_commitment(e.label())
        .map(|c| commitments.insert(e, c))
    };

    for e in [Entity::W1, Entity::W2, Entity::W3] {
      receive(&mut transcript, e)?;
    }
    let eta = transcript.get_challenge("eta")?;

    receive(&mut transcript, Entity::SortedAccum)?;
    receive(&mut transcript, Entity::W4)?;
    let [beta, gamma] = <[E::Scalar; 2]>::try_from(transcript.get_challenges(&["beta", "gamma"])?)
      .map_err(|_| HonkError::InternalTranscriptError)?;

    receive(&mut transcript, Entity::ZPerm)?;
    receive(&mut transcript, Entity::ZLookup)?;
    let [alpha, zeta] = <[E::Scalar; 2]>::try_from(transcript.get_challenges(&["alpha", "zeta"])?)
      .map_err(|_| HonkError::InternalTranscriptError)?;

    let params = RelationParameters {
      eta,
      beta,
      gamma,
      public_input_delta: compute_public_input_delta(
        public_inputs,
        &beta,
        &gamma,
        n,
        vk.pub_inputs_offset,
      )?,
      lookup_grand_product_delta: compute_lookup_grand_product_delta(&beta, &gamma, n),
    };

    let sumcheck = SumcheckVerifier::verify(&mut transcript, d, &params, &alpha, &zeta)?;

    // batch commitments and evaluations with powers of rho, unshifted first
    let rho = transcript.get_challenge("rho")?;
    let rhos = powers(&rho, NUM_UNSHIFTED_ENTITIES + Entity::TO_BE_SHIFTED.len());
    let lookup = |e: &Entity| {
      commitments
        .get(e)
        .cloned()
        .ok_or_else(|| HonkError::ProofVerifyError {
          reason: format!("missing commitment {}", e.label()),
        })
    };
    let unshifted = Entity::ALL[..NUM_UNSHIFTED_ENTITIES]
      .iter()
      .map(lookup)
      .collect::<Result<Vec<_>, _>>()?;
    let to_be_shifted = Entity::TO_BE_SHIFTED
      .iter()
      .map(lookup)
      .collect::<Result<Vec<_>, _>>()?;
    let batched_unshifted = E::PCS::combine(&unshifted, &rhos[..NUM_UNSHIFTED_ENTITIES])?;
    let batched_to_be_shifted = E::PCS::combine(&to_be_shifted, &rhos[NUM_UNSHIFTED_ENTITIES..])?;

    let evals = &sumcheck.claimed_evaluations;
    let batched_evaluation = evals
      .unshifted()
      .iter()
      .chain(evals.shifted())
      .zip(&rhos)
      .map(|(v, r)| *v * r)
      .sum::<E::Scalar>();

    let gemini_claims = GeminiVerifier::reduce_verification(
      &mut transcript,
      &sumcheck.challenge,
      &batched_evaluation,
      &batched_unshifted,
      &batched_to_be_shifted,
    )?;
    let claim = ShplonkVerifier::reduce_verification(&mut transcript, &gemini_claims)?;

    E::PCS::verify(
      &vk.vk_pcs,
      transcript.engine_mut(),
      &claim.commitment,
      &claim.opening_pair.challenge,
      &claim.opening_pair.evaluation,
      proof.opening(),
    )?;
    transcript.finish()?;

    info!(elapsed_ms = %verify_t.elapsed().as_millis(), "ultra_verify");
    Ok(())
  }
}
