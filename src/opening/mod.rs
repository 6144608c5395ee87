//! Reductions from multilinear evaluation claims to a single univariate opening.
//!
//! [`gemini`] turns the claimed evaluations of the relation check into a family of
//! univariate claims at `r`, `-r` and `-r^{2^l}`. [`shplonk`] batches any set of univariate
//! claims into one claim at a fresh point `z`, which the commitment scheme then opens.
use crate::{Commitment, traits::Engine};
use ff::PrimeField;

pub mod gemini;
pub mod shplonk;

/// A point and the value a polynomial takes there
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpeningPair<F: PrimeField> {
  /// The evaluation point
  pub challenge: F,
  /// The claimed value
  pub evaluation: F,
}

/// A prover-side claim: the polynomial (coefficients, lowest degree first) and its opening pair
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpeningClaim<F: PrimeField> {
  /// The polynomial being opened
  pub polynomial: Vec<F>,
  /// Where it is opened and to what
  pub opening_pair: OpeningPair<F>,
}

/// A verifier-side claim: a commitment and its opening pair
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifierOpeningClaim<E: Engine> {
  /// Commitment to the polynomial being opened
  pub commitment: Commitment<E>,
  /// Where it is opened and to what
  pub opening_pair: OpeningPair<E::Scalar>,
}
