//! This module implements a transparent univariate polynomial commitment scheme from the
//! inner product argument of Bulletproofs.
//!
//! A polynomial is committed with a Pedersen vector commitment to its coefficients. An
//! opening at `z` proves `v = <a, (1, z, z^2, ...)>` with `log n` rounds of folding, where
//! `n` is the size of the commitment key; shorter polynomials are zero-padded.
use crate::{
  errors::HonkError,
  polys::univariate::{UniPoly, batch_invert},
  provider::{msm::msm, traits::DlogGroup},
  start_span,
  traits::{
    Engine,
    pcs::{CommitmentTrait, Len, PCSEngineTrait},
    transcript::{TranscriptEngineTrait, TranscriptReprTrait, powers},
  },
};
use core::marker::PhantomData;
use ff::Field;
use group::{Curve, GroupEncoding, prime::PrimeCurveAffine};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info_span};

type Affine<E> = <<E as Engine>::GE as DlogGroup>::Affine;
type Point<E> = <Affine<E> as PrimeCurveAffine>::Curve;

/// Pedersen generators for the coefficients and the base the inner product is committed under
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct IPACommitmentKey<E: Engine>
where
  E::GE: DlogGroup,
{
  ck: Vec<Affine<E>>,
  u: Affine<E>,
}

/// The verifier needs every generator to recompute the folded one
pub type IPAVerifierKey<E> = IPACommitmentKey<E>;

/// A Pedersen commitment to the coefficients
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct IPACommitment<E: Engine>
where
  E::GE: DlogGroup,
{
  comm: Affine<E>,
}

/// The cross terms of every folding round and the fully folded coefficient
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct IPAEvaluationArgument<E: Engine>
where
  E::GE: DlogGroup,
{
  L_vec: Vec<IPACommitment<E>>,
  R_vec: Vec<IPACommitment<E>>,
  a_hat: E::Scalar,
}

/// Provides the IPA commitment scheme
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IPAPCS<E: Engine> {
  _p: PhantomData<E>,
}

impl<E: Engine> Len for IPACommitmentKey<E>
where
  E::GE: DlogGroup,
{
  fn length(&self) -> usize {
    self.ck.len()
  }
}

impl<E: Engine> TranscriptReprTrait<E::GE> for IPACommitment<E>
where
  E::GE: DlogGroup,
{
  fn to_transcript_bytes(&self) -> Vec<u8> {
    self.comm.to_bytes().as_ref().to_vec()
  }
}

impl<E: Engine> CommitmentTrait<E> for IPACommitment<E> where E::GE: DlogGroup {}

fn inner_product<F: Field>(a: &[F], b: &[F]) -> F {
  a.par_iter()
    .zip(b.par_iter())
    .map(|(a, b)| *a * b)
    .reduce(|| F::ZERO, |x, y| x + y)
}

// g_L * x_inv + g_R * x
fn fold_generators<C: PrimeCurveAffine>(gens: &[C], x: &C::Scalar, x_inv: &C::Scalar) -> Vec<C>
where
  C::Curve: Send,
{
  let (g_L, g_R) = gens.split_at(gens.len() / 2);
  let projective = g_L
    .par_iter()
    .zip(g_R.par_iter())
    .map(|(l, r)| *l * *x_inv + *r * *x)
    .collect::<Vec<_>>();
  let mut folded = vec![C::identity(); projective.len()];
  C::Curve::batch_normalize(&projective, &mut folded);
  folded
}

// a_L * x + a_R * x_inv, or with the roles of x and x_inv swapped
fn fold_scalars<F: Field>(v: &[F], left: &F, right: &F) -> Vec<F> {
  let (v_L, v_R) = v.split_at(v.len() / 2);
  v_L
    .par_iter()
    .zip(v_R.par_iter())
    .map(|(l, r)| *l * left + *r * right)
    .collect()
}

impl<E: Engine> IPAPCS<E>
where
  E::GE: DlogGroup,
{
  // binds the claim and derives the base the inner product is committed under
  fn inner_product_base(
    transcript: &mut E::TE,
    u: &Affine<E>,
    point: &E::Scalar,
    eval: &E::Scalar,
  ) -> Result<Point<E>, HonkError> {
    transcript.absorb(b"IPA:z", point);
    transcript.absorb(b"IPA:v", eval);
    let r = transcript.squeeze(b"IPA:r")?;
    Ok(*u * r)
  }
}

impl<E: Engine> PCSEngineTrait<E> for IPAPCS<E>
where
  E::GE: DlogGroup,
{
  type CommitmentKey = IPACommitmentKey<E>;
  type VerifierKey = IPAVerifierKey<E>;
  type Commitment = IPACommitment<E>;
  type EvaluationArgument = IPAEvaluationArgument<E>;

  fn setup(label: &'static [u8], n: usize) -> (Self::CommitmentKey, Self::VerifierKey) {
    let (_setup_span, setup_t) = start_span!("ipa_setup", n = n);
    let n = n.next_power_of_two();
    let gens = <E::GE as DlogGroup>::from_label(label, n + 1);
    let ck = IPACommitmentKey {
      u: gens[0],
      ck: gens[1..].to_vec(),
    };
    debug!(elapsed_ms = %setup_t.elapsed().as_millis(), n = n, "ipa_setup");
    (ck.clone(), ck)
  }

  fn commit(ck: &Self::CommitmentKey, coeffs: &[E::Scalar]) -> Result<Self::Commitment, HonkError> {
    if coeffs.len() > ck.ck.len() {
      return Err(HonkError::InvalidVectorSize {
        actual: coeffs.len(),
        max: ck.ck.len(),
      });
    }
    let comm = msm(coeffs, &ck.ck[..coeffs.len()])?;
    Ok(IPACommitment {
      comm: comm.to_affine(),
    })
  }

  fn combine(
    comms: &[Self::Commitment],
    scalars: &[E::Scalar],
  ) -> Result<Self::Commitment, HonkError> {
    let bases = comms.iter().map(|c| c.comm).collect::<Vec<_>>();
    let comm = msm(scalars, &bases)?;
    Ok(IPACommitment {
      comm: comm.to_affine(),
    })
  }

  fn prove(
    ck: &Self::CommitmentKey,
    transcript: &mut E::TE,
    coeffs: &[E::Scalar],
    point: &E::Scalar,
  ) -> Result<(E::Scalar, Self::EvaluationArgument), HonkError> {
    let n = ck.ck.len();
    if coeffs.len() > n {
      return Err(HonkError::InvalidVectorSize {
        actual: coeffs.len(),
        max: n,
      });
    }
    let eval = UniPoly::new(coeffs.to_vec()).evaluate(point);
    let u = Self::inner_product_base(transcript, &ck.u, point, &eval)?;

    let mut a_vec = coeffs.to_vec();
    a_vec.resize(n, E::Scalar::ZERO);
    let mut b_vec = powers(point, n);
    let mut gens = ck.ck.clone();
    let mut L_vec = Vec::new();
    let mut R_vec = Vec::new();

    while a_vec.len() > 1 {
      let m = a_vec.len() / 2;
      let (a_L, a_R) = a_vec.split_at(m);
      let (b_L, b_R) = b_vec.split_at(m);
      let (g_L, g_R) = gens.split_at(m);

      let L = IPACommitment::<E> {
        comm: (msm(a_L, g_R)? + u * inner_product(a_L, b_R)).to_affine(),
      };
      let R = IPACommitment::<E> {
        comm: (msm(a_R, g_L)? + u * inner_product(a_R, b_L)).to_affine(),
      };
      transcript.absorb(b"IPA:L", &L);
      transcript.absorb(b"IPA:R", &R);
      let x = transcript.squeeze(b"IPA:x")?;
      let x_inv = Option::<E::Scalar>::from(x.invert()).ok_or(HonkError::DivisionByZero)?;

      a_vec = fold_scalars(&a_vec, &x, &x_inv);
      b_vec = fold_scalars(&b_vec, &x_inv, &x);
      gens = fold_generators(&gens, &x, &x_inv);
      L_vec.push(L);
      R_vec.push(R);
    }

    let a_hat = *a_vec
      .first()
      .ok_or(HonkError::InvalidCommitmentKeyLength)?;
    let arg = IPAEvaluationArgument {
      L_vec,
      R_vec,
      a_hat,
    };
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
    let n = vk.ck.len();
    let k = arg.L_vec.len();
    if arg.R_vec.len() != k || k >= usize::BITS as usize || 1 << k != n {
      return Err(HonkError::InvalidPCS);
    }
    let u = Self::inner_product_base(transcript, &vk.u, point, eval)?;

    let x = arg
      .L_vec
      .iter()
      .zip(arg.R_vec.iter())
      .map(|(L, R)| {
        transcript.absorb(b"IPA:L", L);
        transcript.absorb(b"IPA:R", R);
        transcript.squeeze(b"IPA:x")
      })
      .collect::<Result<Vec<_>, _>>()?;
    let mut x_inv = x.clone();
    batch_invert(&mut x_inv)?;
    let x_sq = x.iter().map(|x| x.square()).collect::<Vec<_>>();
    let x_inv_sq = x_inv.iter().map(|x| x.square()).collect::<Vec<_>>();

    // s[j] is the product over rounds of x_i or x_i^{-1}, by bit k - 1 - i of j
    let mut s = vec![E::Scalar::ZERO; n];
    s[0] = x_inv.iter().product();
    for j in 1..n {
      let pos = j.ilog2() as usize;
      s[j] = s[j - (1 << pos)] * x_sq[k - 1 - pos];
    }

    let g_hat = msm(&s, &vk.ck)?;
    let b_hat = inner_product(&powers(point, n), &s);

    let cross_terms = arg
      .L_vec
      .iter()
      .chain(arg.R_vec.iter())
      .map(|c| c.comm)
      .collect::<Vec<_>>();
    let cross_scalars = x_sq.into_iter().chain(x_inv_sq).collect::<Vec<_>>();
    let P_hat = comm.comm.to_curve() + u * eval + msm(&cross_scalars, &cross_terms)?;

    if P_hat == g_hat * arg.a_hat + u * (arg.a_hat * b_hat) {
      Ok(())
    } else {
      Err(HonkError::InvalidPCS)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::provider::GrumpkinEngineIPA;
  use rand::{SeedableRng, rngs::StdRng};

  type E = GrumpkinEngineIPA;
  type F = <E as Engine>::Scalar;
  type PCS = IPAPCS<E>;

  fn random_poly(rng: &mut StdRng, len: usize) -> Vec<F> {
    (0..len).map(|_| F::random(&mut *rng)).collect()
  }

  #[test]
  fn test_setup_rounds_up_to_power_of_two() {
    let (ck, _) = PCS::setup(b"test", 6);
    assert_eq!(ck.length(), 8);
  }

  #[test]
  fn test_open_and_verify() {
    let mut rng = StdRng::seed_from_u64(41);
    let (ck, vk) = PCS::setup(b"test", 16);
    for len in [1, 5, 16] {
      let p = random_poly(&mut rng, len);
      let z = F::random(&mut rng);
      let comm = PCS::commit(&ck, &p).unwrap();

      let mut pt = <E as Engine>::TE::new(b"ipa");
      let (eval, arg) = PCS::prove(&ck, &mut pt, &p, &z).unwrap();
      assert_eq!(eval, UniPoly::new(p.clone()).evaluate(&z));
      assert_eq!(arg.L_vec.len(), 4);

      let mut vt = <E as Engine>::TE::new(b"ipa");
      PCS::verify(&vk, &mut vt, &comm, &z, &eval, &arg).unwrap();
    }
  }

  #[test]
  fn test_wrong_claims_are_rejected() {
    let mut rng = StdRng::seed_from_u64(42);
    let (ck, vk) = PCS::setup(b"test", 8);
    let p = random_poly(&mut rng, 8);
    let z = F::random(&mut rng);
    let comm = PCS::commit(&ck, &p).unwrap();
    let mut pt = <E as Engine>::TE::new(b"ipa");
    let (eval, arg) = PCS::prove(&ck, &mut pt, &p, &z).unwrap();

    let mut vt = <E as Engine>::TE::new(b"ipa");
    assert_eq!(
      PCS::verify(&vk, &mut vt, &comm, &z, &(eval + F::ONE), &arg),
      Err(HonkError::InvalidPCS)
    );

    let other = PCS::commit(&ck, &random_poly(&mut rng, 8)).unwrap();
    let mut vt = <E as Engine>::TE::new(b"ipa");
    assert!(PCS::verify(&vk, &mut vt, &other, &z, &eval, &arg).is_err());

    let mut truncated = arg.clone();
    truncated.L_vec.pop();
    let mut vt = <E as Engine>::TE::new(b"ipa");
    assert_eq!(
      PCS::verify(&vk, &mut vt, &comm, &z, &eval, &truncated),
      Err(HonkError::InvalidPCS)
    );
  }

  #[test]
  fn test_combine_is_linear() {
    let mut rng = StdRng::seed_from_u64(43);
    let (ck, _) = PCS::setup(b"test", 8);
    let p = random_poly(&mut rng, 8);
    let q = random_poly(&mut rng, 3);
    let a = F::random(&mut rng);

    let combined_coeffs = (0..8)
      .map(|i| p[i] + a * q.get(i).copied().unwrap_or(F::ZERO))
      .collect::<Vec<_>>();
    let comms = [PCS::commit(&ck, &p).unwrap(), PCS::commit(&ck, &q).unwrap()];
    assert_eq!(
      PCS::combine(&comms, &[F::ONE, a]).unwrap(),
      PCS::commit(&ck, &combined_coeffs).unwrap()
    );
  }
}
