//! This module provides the trait definitions for transcript functionality.
//! Transcripts are used for Fiat-Shamir transformations to make the interactive
//! Honk protocol non-interactive.
use crate::{
  errors::HonkError,
  traits::{Engine, Group},
};

/// This trait allows types to implement how they want to be added to `TranscriptEngine`
pub trait TranscriptReprTrait<G: Group>: Send + Sync {
  /// returns a byte representation of self to be added to the transcript
  fn to_transcript_bytes(&self) -> Vec<u8>;
}

/// This trait defines the behavior of a hash-chain transcript engine.
///
/// Engines must reject a [`squeeze`](TranscriptEngineTrait::squeeze) that follows another
/// squeeze with nothing absorbed in between: such a challenge would not be bound to any
/// new prover message. The first squeeze after [`new`](TranscriptEngineTrait::new) is
/// seeded by the construction label and is always allowed.
pub trait TranscriptEngineTrait<E: Engine>: Send + Sync {
  /// initializes the transcript
  fn new(label: &'static [u8]) -> Self;

  /// returns a scalar element of the group as a challenge
  fn squeeze(&mut self, label: &[u8]) -> Result<E::Scalar, HonkError>;

  /// returns one challenge per label, all bound to the data absorbed so far
  fn squeeze_many(&mut self, labels: &[&[u8]]) -> Result<Vec<E::Scalar>, HonkError>;

  /// absorbs any type that implements `TranscriptReprTrait` under a label
  fn absorb<T: TranscriptReprTrait<E::GE>>(&mut self, label: &[u8], o: &T);
}

/// Returns `[1, r, r^2, ..., r^{len-1}]`.
pub fn powers<F: ff::Field>(r: &F, len: usize) -> Vec<F> {
  let mut r_vec = Vec::with_capacity(len);
  let mut cur = F::ONE;
  for _ in 0..len {
    r_vec.push(cur);
    cur *= r;
  }
  r_vec
}

impl<G: Group, T: TranscriptReprTrait<G>> TranscriptReprTrait<G> for &[T] {
  fn to_transcript_bytes(&self) -> Vec<u8> {
    self
      .iter()
      .flat_map(|t| t.to_transcript_bytes())
      .collect::<Vec<u8>>()
  }
}

impl<G: Group> TranscriptReprTrait<G> for u64 {
  fn to_transcript_bytes(&self) -> Vec<u8> {
    self.to_le_bytes().to_vec()
  }
}

impl<G: Group> TranscriptReprTrait<G> for [u8; 32] {
  fn to_transcript_bytes(&self) -> Vec<u8> {
    self.to_vec()
  }
}
