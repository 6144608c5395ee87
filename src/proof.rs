//! The proof object and its byte encoding.
//!
//! A proof is the ordered list of labeled messages the prover sent through the transcript,
//! followed by the commitment scheme's opening argument for the final batched claim.
use crate::{
  Commitment, EvaluationArgument,
  errors::HonkError,
  traits::{Engine, transcript::TranscriptReprTrait},
};
use bincode::Options;
use serde::{Deserialize, Serialize};

/// A single prover message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum ProofElement<E: Engine> {
  /// A size or offset
  Index(u64),
  /// A field element
  Scalar(E::Scalar),
  /// A vector of field elements, such as the evaluations of a round univariate
  Scalars(Vec<E::Scalar>),
  /// A polynomial commitment
  Commitment(Commitment<E>),
}

impl<E: Engine> ProofElement<E> {
  /// A short name for the element's kind, used in error messages
  pub fn kind(&self) -> &'static str {
    match self {
      ProofElement::Index(_) => "index",
      ProofElement::Scalar(_) => "scalar",
      ProofElement::Scalars(_) => "scalars",
      ProofElement::Commitment(_) => "commitment",
    }
  }
}

impl<E: Engine> TranscriptReprTrait<E::GE> for ProofElement<E> {
  fn to_transcript_bytes(&self) -> Vec<u8> {
    match self {
      ProofElement::Index(i) => <u64 as TranscriptReprTrait<E::GE>>::to_transcript_bytes(i),
      ProofElement::Scalar(s) => s.to_transcript_bytes(),
      ProofElement::Scalars(v) => v.as_slice().to_transcript_bytes(),
      ProofElement::Commitment(c) => c.to_transcript_bytes(),
    }
  }
}

/// A labeled prover message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ProofEntry<E: Engine> {
  /// The transcript label the message was absorbed under
  pub label: String,
  /// The message
  pub element: ProofElement<E>,
}

/// A complete UltraHonk proof
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Proof<E: Engine> {
  pub(crate) entries: Vec<ProofEntry<E>>,
  pub(crate) opening: EvaluationArgument<E>,
}

fn bincode_options() -> impl Options {
  bincode::DefaultOptions::new()
    .with_little_endian()
    .with_fixint_encoding()
}

impl<E: Engine> Proof<E> {
  /// The prover messages, in transcript order
  pub fn entries(&self) -> &[ProofEntry<E>] {
    &self.entries
  }

  /// The opening argument of the final batched claim
  pub fn opening(&self) -> &EvaluationArgument<E> {
    &self.opening
  }

  /// Looks up the commitment sent under `label`
  pub fn commitment(&self, label: &str) -> Option<&Commitment<E>> {
    self.entries.iter().find_map(|entry| match &entry.element {
      ProofElement::Commitment(c) if entry.label == label => Some(c),
      _ => None,
    })
  }

  /// Encodes the proof with a fixed little-endian, fixed-width integer layout
  pub fn to_bytes(&self) -> Result<Vec<u8>, HonkError> {
    bincode_options()
      .serialize(self)
      .map_err(|e| HonkError::SerializationError {
        reason: e.to_string(),
      })
  }

  /// Decodes a proof produced by [`Proof::to_bytes`]
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, HonkError> {
    bincode_options()
      .reject_trailing_bytes()
      .deserialize(bytes)
      .map_err(|e| HonkError::SerializationError {
        reason: e.to_string(),
      })
  }
}
