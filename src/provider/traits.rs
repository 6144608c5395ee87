//! Group capabilities required by the concrete commitment schemes in this crate.
use crate::traits::Group;
use core::fmt::Debug;
use halo2curves::CurveAffine;
use serde::{Deserialize, Serialize};

/// A group equipped with a bilinear pairing `e: G1 x G2 -> GT`.
///
/// KZG commitments live in `G1`; the structured reference string additionally
/// carries `[1]_2` and `[tau]_2`.
pub trait PairingGroup: Group + Serialize + for<'de> Deserialize<'de> {
  /// Affine representation of points in the first source group
  type G1Affine: CurveAffine<ScalarExt = Self::Scalar> + Serialize + for<'de> Deserialize<'de>;

  /// Affine representation of points in the second source group
  type G2Affine: Clone
    + Copy
    + Debug
    + PartialEq
    + Eq
    + Send
    + Sync
    + Serialize
    + for<'de> Deserialize<'de>;

  /// The target group of the pairing
  type GT: PartialEq + Debug;

  /// Returns the fixed generator of the first source group
  fn g1_generator() -> Self::G1Affine;

  /// Returns the fixed generator of the second source group
  fn g2_generator() -> Self::G2Affine;

  /// Returns `s * g2_generator()`
  fn g2_mul_generator(s: &Self::Scalar) -> Self::G2Affine;

  /// Evaluates the pairing
  fn pairing(p: &Self::G1Affine, q: &Self::G2Affine) -> Self::GT;
}

/// A group in which discrete logarithms are hard, with generators derived from a label
pub trait DlogGroup: Group + Serialize + for<'de> Deserialize<'de> {
  /// Affine representation of group elements
  type Affine: CurveAffine<ScalarExt = Self::Scalar> + Serialize + for<'de> Deserialize<'de>;

  /// Derives `n` generators with unknown discrete logarithms relative to each other
  fn from_label(label: &'static [u8], n: usize) -> Vec<Self::Affine>;
}
