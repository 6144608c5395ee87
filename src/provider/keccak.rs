//! This module provides an implementation of `TranscriptEngineTrait` using Keccak256
use crate::{
  errors::HonkError,
  traits::{
    Engine, PrimeFieldExt,
    transcript::{TranscriptEngineTrait, TranscriptReprTrait},
  },
};
use core::marker::PhantomData;
use sha3::{Digest, Keccak256};

const PERSONA_TAG: &[u8] = b"UHTR";
const DOM_SEP_TAG: &[u8] = b"UHDS";
const KECCAK256_STATE_SIZE: usize = 64;
const KECCAK256_PREFIX_CHALLENGE_LO: u8 = 0;
const KECCAK256_PREFIX_CHALLENGE_HI: u8 = 1;

/// Provides an implementation of `TranscriptEngine`
#[derive(Debug, Clone)]
pub struct Keccak256Transcript<E: Engine> {
  round: u16,
  state: [u8; KECCAK256_STATE_SIZE],
  transcript: Keccak256,
  // true until the first challenge, and after every absorb
  bound: bool,
  _p: PhantomData<E>,
}

fn compute_updated_state(keccak_instance: Keccak256, input: &[u8]) -> [u8; KECCAK256_STATE_SIZE] {
  let mut updated_instance = keccak_instance;
  updated_instance.update(input);

  let input_lo = &[KECCAK256_PREFIX_CHALLENGE_LO];
  let input_hi = &[KECCAK256_PREFIX_CHALLENGE_HI];

  let mut hasher_lo = updated_instance.clone();
  let mut hasher_hi = updated_instance;

  hasher_lo.update(input_lo);
  hasher_hi.update(input_hi);

  let output_lo = hasher_lo.finalize();
  let output_hi = hasher_hi.finalize();

  let mut state = [0u8; KECCAK256_STATE_SIZE];
  state[..32].copy_from_slice(&output_lo);
  state[32..].copy_from_slice(&output_hi);
  state
}

impl<E: Engine> Keccak256Transcript<E> {
  // derives the next challenge from the running state, without checking binding
  fn derive(&mut self, label: &[u8]) -> Result<E::Scalar, HonkError> {
    let input = [
      DOM_SEP_TAG,
      self.round.to_le_bytes().as_ref(),
      self.state.as_ref(),
      label,
    ]
    .concat();
    let output = compute_updated_state(self.transcript.clone(), &input);

    // update state
    self.round = self
      .round
      .checked_add(1)
      .ok_or(HonkError::InternalTranscriptError)?;
    self.state.copy_from_slice(&output);
    self.transcript = Keccak256::new();

    Ok(E::Scalar::from_uniform(&output))
  }

  fn check_bound(&self, label: &[u8]) -> Result<(), HonkError> {
    if self.bound {
      Ok(())
    } else {
      Err(HonkError::TranscriptMisuse {
        reason: format!(
          "challenge {} requested with no data absorbed since the previous challenge",
          String::from_utf8_lossy(label)
        ),
      })
    }
  }
}

impl<E: Engine> TranscriptEngineTrait<E> for Keccak256Transcript<E> {
  fn new(label: &'static [u8]) -> Self {
    let keccak_instance = Keccak256::new();
    let input = [PERSONA_TAG, label].concat();
    let output = compute_updated_state(keccak_instance.clone(), &input);

    Self {
      round: 0u16,
      state: output,
      transcript: keccak_instance,
      bound: true,
      _p: PhantomData,
    }
  }

  fn squeeze(&mut self, label: &[u8]) -> Result<E::Scalar, HonkError> {
    self.check_bound(label)?;
    let c = self.derive(label)?;
    self.bound = false;
    Ok(c)
  }

  fn squeeze_many(&mut self, labels: &[&[u8]]) -> Result<Vec<E::Scalar>, HonkError> {
    let first = labels.first().ok_or(HonkError::InvalidInputLength)?;
    self.check_bound(first)?;
    let challenges = labels
      .iter()
      .map(|label| self.derive(label))
      .collect::<Result<Vec<_>, _>>()?;
    self.bound = false;
    Ok(challenges)
  }

  fn absorb<T: TranscriptReprTrait<E::GE>>(&mut self, label: &[u8], o: &T) {
    self.transcript.update(label);
    self.transcript.update(o.to_transcript_bytes());
    self.bound = true;
  }
}
