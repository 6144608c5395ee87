//! Digests of verification keys.
//!
//! A verification key is serialized with a fixed bincode configuration and hashed with
//! SHA3-256. The prover and verifier both bind this digest into the transcript before
//! any proof element, so a proof only verifies against the key it was produced for.
use crate::errors::HonkError;
use bincode::Options;
use serde::Serialize;
use sha3::{Digest, Sha3_256};
use std::io;

/// A 32-byte digest.
pub type HonkDigest = [u8; 32];

/// Types whose canonical bytes can be fed to a digest.
pub trait Digestible {
  /// Writes the canonical byte representation of `self` into `byte_sink`.
  fn write_bytes<W: Sized + io::Write>(&self, byte_sink: &mut W) -> Result<(), io::Error>;
}

/// Marker trait for types whose bincode encoding is their canonical representation.
pub trait SimpleDigestible: Serialize {}

impl<T: SimpleDigestible> Digestible for T {
  fn write_bytes<W: Sized + io::Write>(&self, byte_sink: &mut W) -> Result<(), io::Error> {
    bincode::DefaultOptions::new()
      .with_little_endian()
      .with_fixint_encoding()
      .serialize_into(byte_sink, self)
      .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
  }
}

/// Computes the SHA3-256 digest of a `Digestible` value.
pub struct DigestComputer<'a, T> {
  inner: &'a T,
}

impl<'a, T: Digestible> DigestComputer<'a, T> {
  /// Creates a computer over `inner`.
  pub fn new(inner: &'a T) -> Self {
    DigestComputer { inner }
  }

  /// Returns the digest.
  pub fn digest(&self) -> Result<HonkDigest, HonkError> {
    let mut hasher = Sha3_256::new();
    self
      .inner
      .write_bytes(&mut hasher)
      .map_err(|e| HonkError::DigestError {
        reason: e.to_string(),
      })?;
    Ok(hasher.finalize().into())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use once_cell::sync::OnceCell;
  use serde::Deserialize;

  #[derive(Serialize, Deserialize)]
  struct Key {
    size: usize,
    #[serde(skip, default = "OnceCell::new")]
    digest: OnceCell<HonkDigest>,
  }

  impl SimpleDigestible for Key {}

  #[test]
  fn test_cached_digest_is_not_hashed() {
    let fresh = Key {
      size: 16,
      digest: OnceCell::new(),
    };
    let cached = OnceCell::new();
    cached.set([9u8; 32]).unwrap();
    let stale = Key {
      size: 16,
      digest: cached,
    };

    assert_eq!(
      DigestComputer::new(&fresh).digest().unwrap(),
      DigestComputer::new(&stale).digest().unwrap()
    );
  }

  #[test]
  fn test_digest_depends_on_contents() {
    let a = Key {
      size: 16,
      digest: OnceCell::new(),
    };
    let b = Key {
      size: 32,
      digest: OnceCell::new(),
    };
    assert_ne!(
      DigestComputer::new(&a).digest().unwrap(),
      DigestComputer::new(&b).digest().unwrap()
    );
  }
}
