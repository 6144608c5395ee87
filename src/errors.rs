//! This module defines errors returned by the library.
use core::fmt::Debug;
use thiserror::Error;

/// Errors returned by the UltraHonk prover and verifier
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum HonkError {
  /// returned if the supplied row, column or variable index is out of range
  #[error("InvalidIndex")]
  InvalidIndex,
  /// returned if the supplied input is not of the right length
  #[error("InvalidInputLength")]
  InvalidInputLength,
  /// returned if the supplied witness does not match the shape of the proving key
  #[error("InvalidWitnessLength: {reason}")]
  InvalidWitnessLength {
    /// The reason for the witness shape mismatch
    reason: String,
  },
  /// returned if the circuit size is not a power of two or is too small
  #[error("InvalidCircuitSize: {size}")]
  InvalidCircuitSize {
    /// The offending circuit size
    size: usize,
  },
  /// returned if the supplied witness does not satisfy the circuit
  #[error("UnSat: {reason}")]
  UnSat {
    /// The reason for circuit UnSat failure
    reason: String,
  },
  /// returned if a lookup gate reads a value that is not present in its table
  #[error("InvalidLookup: {reason}")]
  InvalidLookup {
    /// The reason for the lookup failure
    reason: String,
  },
  /// returned if proof verification fails
  #[error("ProofVerifyError: {reason}")]
  ProofVerifyError {
    /// The reason for the proof verification error
    reason: String,
  },
  /// returned if the provided commitment key is not of sufficient length
  #[error("InvalidCommitmentKeyLength")]
  InvalidCommitmentKeyLength,
  /// returned when an invalid PCS evaluation argument is provided
  #[error("InvalidPCS")]
  InvalidPCS,
  /// returned when an invalid sum-check proof is provided
  #[error("InvalidSumcheckProof")]
  InvalidSumcheckProof,
  /// returned when the transcript engine encounters an overflow of the round number
  #[error("InternalTranscriptError")]
  InternalTranscriptError,
  /// returned when a challenge is requested without new data bound to the transcript
  #[error("TranscriptMisuse: {reason}")]
  TranscriptMisuse {
    /// The reason for the transcript misuse
    reason: String,
  },
  /// returned when a prover round is executed out of order
  #[error("RoundOutOfOrder: expected {expected}, found {found}")]
  RoundOutOfOrder {
    /// The round the prover was ready to execute
    expected: String,
    /// The round that was requested
    found: String,
  },
  /// returned when a job in the work queue fails to materialize
  #[error("QueueError: {reason}")]
  QueueError {
    /// The reason for the queue failure
    reason: String,
  },
  /// returned when a proof cannot be encoded or decoded
  #[error("SerializationError: {reason}")]
  SerializationError {
    /// The reason for the serialization failure
    reason: String,
  },
  /// returned when there is an error creating a digest
  #[error("DigestError: {reason}")]
  DigestError {
    /// The reason for the digest error
    reason: String,
  },
  /// returned when attempting to divide by zero
  #[error("DivisionByZero")]
  DivisionByZero,
  /// returned when input vector size exceeds commitment key capacity
  #[error("InvalidVectorSize: {actual} > {max}")]
  InvalidVectorSize {
    /// The actual size of the input vector
    actual: usize,
    /// The maximum size that can be handled
    max: usize,
  },
}
