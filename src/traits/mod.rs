//! This module defines the capability traits a proof-system flavor is assembled from.
//!
//! A flavor is a type implementing [`Engine`]: it fixes the scalar field, the group used
//! for commitments, the Fiat-Shamir transcript engine and the polynomial commitment scheme.
//! The prover and verifier are generic over `E: Engine` and never dispatch on the flavor
//! at runtime.
use core::fmt::Debug;
use ff::PrimeField;
use serde::{Deserialize, Serialize};

pub mod pcs;
pub mod transcript;

use pcs::PCSEngineTrait;
use transcript::{TranscriptEngineTrait, TranscriptReprTrait};

/// Represents an element of a group used for commitments
pub trait Group: Clone + Copy + Debug + Send + Sync + Sized + Eq + PartialEq {
  /// A type representing an element of the scalar field of the group
  type Scalar: PrimeField + PrimeFieldExt + Send + Sync + Serialize + for<'de> Deserialize<'de>;
}

/// A collection of engines that are required by the library
pub trait Engine: Clone + Copy + Debug + Send + Sync + Sized + Eq + PartialEq {
  /// A type representing an element of the scalar field of the group
  type Scalar: PrimeField
    + PrimeFieldExt
    + Send
    + Sync
    + TranscriptReprTrait<Self::GE>
    + Serialize
    + for<'de> Deserialize<'de>;

  /// A type that represents an element of the group
  type GE: Group<Scalar = Self::Scalar> + Serialize + for<'de> Deserialize<'de>;

  /// A type that provides a generic Fiat-Shamir transcript to be used when externalizing proofs
  type TE: TranscriptEngineTrait<Self>;

  /// A type that defines a polynomial commitment scheme over scalars in the group
  type PCS: PCSEngineTrait<Self>;
}

/// Defines additional methods on `PrimeField` objects
pub trait PrimeFieldExt: PrimeField {
  /// Returns a scalar representing the bytes
  fn from_uniform(bytes: &[u8]) -> Self;
}
