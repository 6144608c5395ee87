//! This module implements the KZG polynomial commitment scheme for univariate polynomials.
//!
//! The structured reference string is derived deterministically from a label: the trapdoor
//! `tau` is the output of SHAKE256 over the label. Anyone who knows the label knows `tau`,
//! so keys produced by [`KZGPCS::setup`] are only suitable for testing and benchmarking.
//! Production deployments load powers of tau from a trusted ceremony with
//! [`KZGPCS::from_powers`] instead.
use crate::{
  errors::HonkError,
  polys::univariate::UniPoly,
  provider::{msm::msm, traits::PairingGroup},
  start_span,
  traits::{
    Engine, PrimeFieldExt,
    pcs::{CommitmentTrait, Len, PCSEngineTrait},
    transcript::{TranscriptEngineTrait, TranscriptReprTrait, powers},
  },
};
use core::marker::PhantomData;
use digest::{ExtendableOutput, Update, XofReader};
use group::{Curve, GroupEncoding, prime::PrimeCurveAffine};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha3::Shake256;
use std::time::Instant;
use tracing::{debug, info_span};

type G1Affine<E> = <<E as Engine>::GE as PairingGroup>::G1Affine;
type G1<E> = <G1Affine<E> as PrimeCurveAffine>::Curve;
type G2Affine<E> = <<E as Engine>::GE as PairingGroup>::G2Affine;

/// Powers of tau in G1, `[tau^i]_1` for `i < n`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct KZGCommitmentKey<E: Engine>
where
  E::GE: PairingGroup,
{
  powers_of_tau: Vec<G1Affine<E>>,
}

/// The verifier's view of the reference string
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct KZGVerifierKey<E: Engine>
where
  E::GE: PairingGroup,
{
  g1: G1Affine<E>,
  g2: G2Affine<E>,
  tau_g2: G2Affine<E>,
}

/// A commitment `[p(tau)]_1`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct KZGCommitment<E: Engine>
where
  E::GE: PairingGroup,
{
  comm: G1Affine<E>,
}

/// An opening proof: the commitment to the quotient `(p(X) - p(z)) / (X - z)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct KZGEvaluationArgument<E: Engine>
where
  E::GE: PairingGroup,
{
  W: G1Affine<E>,
}

/// Provides the KZG commitment scheme
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KZGPCS<E: Engine> {
  _p: PhantomData<E>,
}

impl<E: Engine> Len for KZGCommitmentKey<E>
where
  E::GE: PairingGroup,
{
  fn length(&self) -> usize {
    self.powers_of_tau.len()
  }
}

impl<E: Engine> KZGCommitment<E>
where
  E::GE: PairingGroup,
{
  /// Returns the underlying group element
  pub fn point(&self) -> &G1Affine<E> {
    &self.comm
  }
}

impl<E: Engine> TranscriptReprTrait<E::GE> for KZGCommitment<E>
where
  E::GE: PairingGroup,
{
  fn to_transcript_bytes(&self) -> Vec<u8> {
    self.comm.to_bytes().as_ref().to_vec()
  }
}

impl<E: Engine> TranscriptReprTrait<E::GE> for KZGEvaluationArgument<E>
where
  E::GE: PairingGroup,
{
  fn to_transcript_bytes(&self) -> Vec<u8> {
    self.W.to_bytes().as_ref().to_vec()
  }
}

impl<E: Engine> CommitmentTrait<E> for KZGCommitment<E> where E::GE: PairingGroup {}

fn trapdoor_from_label<E: Engine>(label: &[u8]) -> E::Scalar {
  let mut shake = Shake256::default();
  shake.update(b"KZG:tau");
  shake.update(label);
  let mut bytes = [0u8; 64];
  shake.finalize_xof().read(&mut bytes);
  E::Scalar::from_uniform(&bytes)
}

impl<E: Engine> KZGPCS<E>
where
  E::GE: PairingGroup,
{
  /// Builds keys from externally generated powers of tau `[tau^i]_1`, together with the
  /// G2 generator and `[tau]_2`.
  ///
  /// # Errors
  /// Returns `HonkError::InvalidCommitmentKeyLength` if `g1_powers` is empty, and
  /// `HonkError::InvalidPCS` if the first power is the identity or the second power does
  /// not match `tau_g2`.
  pub fn from_powers(
    g1_powers: Vec<G1Affine<E>>,
    g2: G2Affine<E>,
    tau_g2: G2Affine<E>,
  ) -> Result<(KZGCommitmentKey<E>, KZGVerifierKey<E>), HonkError> {
    let g1 = *g1_powers
      .first()
      .ok_or(HonkError::InvalidCommitmentKeyLength)?;
    if bool::from(g1.is_identity()) {
      return Err(HonkError::InvalidPCS);
    }
    // e([tau]_1, [1]_2) == e([1]_1, [tau]_2)
    if let Some(tau_g1) = g1_powers.get(1) {
      let left = <E::GE as PairingGroup>::pairing(tau_g1, &g2);
      let right = <E::GE as PairingGroup>::pairing(&g1, &tau_g2);
      if left != right {
        return Err(HonkError::InvalidPCS);
      }
    }
    debug!(n = g1_powers.len(), "kzg_from_powers");
    Ok((
      KZGCommitmentKey {
        powers_of_tau: g1_powers,
      },
      KZGVerifierKey { g1, g2, tau_g2 },
    ))
  }
}

impl<E: Engine> PCSEngineTrait<E> for KZGPCS<E>
where
  E::GE: PairingGroup,
{
  type CommitmentKey = KZGCommitmentKey<E>;
  type VerifierKey = KZGVerifierKey<E>;
  type Commitment = KZGCommitment<E>;
  type EvaluationArgument = KZGEvaluationArgument<E>;

  fn setup(label: &'static [u8], n: usize) -> (Self::CommitmentKey, Self::VerifierKey) {
    let (_setup_span, setup_t) = start_span!("kzg_setup", n = n);
    let g1 = <E::GE as PairingGroup>::g1_generator();
    let g2 = <E::GE as PairingGroup>::g2_generator();

    let tau = trapdoor_from_label::<E>(label);
    let projective = powers(&tau, n)
      .into_par_iter()
      .map(|t| g1 * t)
      .collect::<Vec<G1<E>>>();
    let mut powers_of_tau = vec![G1Affine::<E>::identity(); n];
    G1::<E>::batch_normalize(&projective, &mut powers_of_tau);

    let vk = KZGVerifierKey {
      g1,
      g2,
      tau_g2: <E::GE as PairingGroup>::g2_mul_generator(&tau),
    };
    debug!(elapsed_ms = %setup_t.elapsed().as_millis(), n = n, "kzg_setup");
    (KZGCommitmentKey { powers_of_tau }, vk)
  }

  fn commit(ck: &Self::CommitmentKey, coeffs: &[E::Scalar]) -> Result<Self::Commitment, HonkError> {
    if coeffs.len() > ck.powers_of_tau.len() {
      return Err(HonkError::InvalidVectorSize {
        actual: coeffs.len(),
        max: ck.powers_of_tau.len(),
      });
    }
    let comm = msm(coeffs, &ck.powers_of_tau[..coeffs.len()])?;
    Ok(KZGCommitment {
      comm: comm.to_affine(),
    })
  }

  fn combine(
    comms: &[Self::Commitment],
    scalars: &[E::Scalar],
  ) -> Result<Self::Commitment, HonkError> {
    let bases = comms.iter().map(|c| c.comm).collect::<Vec<_>>();
    let comm = msm(scalars, &bases)?;
    Ok(KZGCommitment {
      comm: comm.to_affine(),
    })
  }

  fn prove(
    ck: &Self::CommitmentKey,
    transcript: &mut E::TE,
    coeffs: &[E::Scalar],
    point: &E::Scalar,
  ) -> Result<(E::Scalar, Self::EvaluationArgument), HonkError> {
    let (quotient, eval) = UniPoly::new(coeffs.to_vec()).divide_by_linear(point);
    let W = Self::commit(ck, quotient.coeffs())?.comm;
    let arg = KZGEvaluationArgument { W };
    transcript.absorb(b"W", &arg);
    Ok((eval, arg))
  }

  fn verify(
    vk: &Self::VerifierKey,
    transcript: &mut E::TE,
    comm: &Self::Commitment,
    point: &E::Scalar,
    eval: &E::Scalar,
    arg: &Self::EvaluationArgument,
  ) -> Result<(), HonkError> {
    transcript.absorb(b"W", arg);

    // e(C - v [1]_1 + z W, [1]_2) == e(W, [tau]_2)
    let lhs = (comm.comm.to_curve() - vk.g1 * eval + arg.W * point).to_affine();
    let left = <E::GE as PairingGroup>::pairing(&lhs, &vk.g2);
    let right = <E::GE as PairingGroup>::pairing(&arg.W, &vk.tau_g2);
    if left == right {
      Ok(())
    } else {
      Err(HonkError::InvalidPCS)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::provider::{Bn256EngineKZG, bn256::bn256};
  use ff::Field;
  use proptest::prelude::*;
  use rand::{SeedableRng, rngs::StdRng};

  type E = Bn256EngineKZG;
  type F = <E as Engine>::Scalar;
  type PCS = KZGPCS<E>;

  fn random_poly(rng: &mut StdRng, len: usize) -> Vec<F> {
    (0..len).map(|_| F::random(&mut *rng)).collect()
  }

  #[test]
  fn test_setup_is_deterministic() {
    let (ck1, vk1) = PCS::setup(b"test", 8);
    let (ck2, vk2) = PCS::setup(b"test", 8);
    assert_eq!(ck1.powers_of_tau, ck2.powers_of_tau);
    assert_eq!(vk1.tau_g2, vk2.tau_g2);
    assert_eq!(ck1.length(), 8);

    let (ck3, _) = PCS::setup(b"other", 8);
    assert_ne!(ck1.powers_of_tau, ck3.powers_of_tau);
  }

  #[test]
  fn test_from_powers_matches_setup() {
    let tau = trapdoor_from_label::<E>(b"test");
    let g1 = <bn256::Point as PairingGroup>::g1_generator();
    let g2 = <bn256::Point as PairingGroup>::g2_generator();
    let tau_g2 = <bn256::Point as PairingGroup>::g2_mul_generator(&tau);
    let g1_powers = powers(&tau, 8)
      .into_iter()
      .map(|t| (g1 * t).to_affine())
      .collect::<Vec<_>>();

    let (ck, vk) = PCS::from_powers(g1_powers.clone(), g2, tau_g2).unwrap();
    let (ck_setup, vk_setup) = PCS::setup(b"test", 8);
    assert_eq!(ck.powers_of_tau, ck_setup.powers_of_tau);
    assert_eq!(vk.g1, vk_setup.g1);
    assert_eq!(vk.tau_g2, vk_setup.tau_g2);

    assert_eq!(
      PCS::from_powers(Vec::new(), g2, tau_g2).unwrap_err(),
      HonkError::InvalidCommitmentKeyLength
    );
    let wrong_tau_g2 = <bn256::Point as PairingGroup>::g2_mul_generator(&(tau + F::ONE));
    assert_eq!(
      PCS::from_powers(g1_powers, g2, wrong_tau_g2).unwrap_err(),
      HonkError::InvalidPCS
    );
  }

  #[test]
  fn test_commit_rejects_oversized_input() {
    let (ck, _) = PCS::setup(b"test", 4);
    let coeffs = vec![F::ONE; 5];
    assert_eq!(
      PCS::commit(&ck, &coeffs),
      Err(HonkError::InvalidVectorSize { actual: 5, max: 4 })
    );
  }

  #[test]
  fn test_combine_is_linear() {
    let mut rng = StdRng::seed_from_u64(21);
    let (ck, _) = PCS::setup(b"test", 8);
    let p = random_poly(&mut rng, 8);
    let q = random_poly(&mut rng, 5);
    let a = F::random(&mut rng);

    let combined_coeffs = (0..8)
      .map(|i| p[i] + a * q.get(i).copied().unwrap_or(F::ZERO))
      .collect::<Vec<_>>();
    let expected = PCS::commit(&ck, &combined_coeffs).unwrap();

    let comms = [PCS::commit(&ck, &p).unwrap(), PCS::commit(&ck, &q).unwrap()];
    assert_eq!(PCS::combine(&comms, &[F::ONE, a]).unwrap(), expected);
  }

  #[test]
  fn test_wrong_evaluation_is_rejected() {
    let mut rng = StdRng::seed_from_u64(22);
    let (ck, vk) = PCS::setup(b"test", 16);
    let p = random_poly(&mut rng, 16);
    let z = F::random(&mut rng);
    let comm = PCS::commit(&ck, &p).unwrap();

    let mut pt = <E as Engine>::TE::new(b"kzg");
    let (eval, arg) = PCS::prove(&ck, &mut pt, &p, &z).unwrap();

    let mut vt = <E as Engine>::TE::new(b"kzg");
    assert!(PCS::verify(&vk, &mut vt, &comm, &z, &eval, &arg).is_ok());

    let mut vt = <E as Engine>::TE::new(b"kzg");
    assert_eq!(
      PCS::verify(&vk, &mut vt, &comm, &z, &(eval + F::ONE), &arg),
      Err(HonkError::InvalidPCS)
    );
  }

  proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]
    #[test]
    fn prop_open_and_verify(seed in any::<u64>(), len in 1usize..17) {
      let mut rng = StdRng::seed_from_u64(seed);
      let (ck, vk) = PCS::setup(b"prop", 16);
      let p = random_poly(&mut rng, len);
      let z = F::random(&mut rng);
      let comm = PCS::commit(&ck, &p).unwrap();

      let mut pt = <E as Engine>::TE::new(b"kzg");
      let (eval, arg) = PCS::prove(&ck, &mut pt, &p, &z).unwrap();
      prop_assert_eq!(eval, UniPoly::new(p.clone()).evaluate(&z));

      let mut vt = <E as Engine>::TE::new(b"kzg");
      prop_assert!(PCS::verify(&vk, &mut vt, &comm, &z, &eval, &arg).is_ok());
    }
  }
}
