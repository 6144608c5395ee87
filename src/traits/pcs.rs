//! This module defines the trait for univariate polynomial commitment schemes.
//!
//! The prover core treats the scheme as a black box: it commits to coefficient vectors,
//! opens a single polynomial at a single point, and (on the verifier side) forms linear
//! combinations of commitments. Everything else is built on top by the Gemini and Shplonk
//! reductions in [`crate::opening`].
use crate::{
  errors::HonkError,
  traits::{Engine, transcript::TranscriptReprTrait},
};
use core::fmt::Debug;
use serde::{Deserialize, Serialize};

/// This trait defines the behavior of the commitment
pub trait CommitmentTrait<E: Engine>:
  Clone
  + Debug
  + PartialEq
  + Eq
  + Send
  + Sync
  + TranscriptReprTrait<E::GE>
  + Serialize
  + for<'de> Deserialize<'de>
{
}

/// A trait for types that quantify their capacity in number of coefficients
pub trait Len {
  /// Returns the maximum number of coefficients a commitment can cover
  fn length(&self) -> usize;
}

/// A trait that ties different pieces of the commitment scheme together
pub trait PCSEngineTrait<E: Engine>: Clone + Send + Sync {
  /// Holds the type of the commitment key
  type CommitmentKey: Clone + Debug + Send + Sync + Len + Serialize + for<'de> Deserialize<'de>;

  /// A type that holds the verifier key
  type VerifierKey: Clone + Debug + Send + Sync + Serialize + for<'de> Deserialize<'de>;

  /// Holds the type of the commitment
  type Commitment: CommitmentTrait<E>;

  /// A type that holds the evaluation argument
  type EvaluationArgument: Clone
    + Debug
    + PartialEq
    + Eq
    + Send
    + Sync
    + Serialize
    + for<'de> Deserialize<'de>;

  /// Samples a new commitment key able to commit to `n` coefficients and a verifier key
  fn setup(label: &'static [u8], n: usize) -> (Self::CommitmentKey, Self::VerifierKey);

  /// Commits to the polynomial with the provided coefficients (lowest degree first)
  fn commit(ck: &Self::CommitmentKey, coeffs: &[E::Scalar]) -> Result<Self::Commitment, HonkError>;

  /// Computes `sum_i scalars[i] * comms[i]`
  fn combine(
    comms: &[Self::Commitment],
    scalars: &[E::Scalar],
  ) -> Result<Self::Commitment, HonkError>;

  /// Opens the polynomial at `point`, returning its evaluation and the opening proof
  fn prove(
    ck: &Self::CommitmentKey,
    transcript: &mut E::TE,
    coeffs: &[E::Scalar],
    point: &E::Scalar,
  ) -> Result<(E::Scalar, Self::EvaluationArgument), HonkError>;

  /// Verifies that the committed polynomial evaluates to `eval` at `point`
  fn verify(
    vk: &Self::VerifierKey,
    transcript: &mut E::TE,
    comm: &Self::Commitment,
    point: &E::Scalar,
    eval: &E::Scalar,
    arg: &Self::EvaluationArgument,
  ) -> Result<(), HonkError>;
}
