//! This module implements the library's group traits for Grumpkin, the curve whose base field
//! is the BN254 scalar field and whose scalar field is the BN254 base field.
use crate::{
  provider::traits::DlogGroup,
  traits::{Group, PrimeFieldExt, transcript::TranscriptReprTrait},
};
use digest::{ExtendableOutput, Update, XofReader};
use ff::{FromUniformBytes, PrimeField};
use group::{Curve, prime::PrimeCurveAffine};
use halo2curves::CurveExt;
use rayon::prelude::*;
use sha3::Shake256;

/// Re-exports that give access to the standard aliases used in the code base, for grumpkin
#[allow(clippy::module_inception)]
pub mod grumpkin {
  pub use halo2curves::grumpkin::{Fq as Base, Fr as Scalar, G1 as Point, G1Affine as Affine};
}

impl Group for grumpkin::Point {
  type Scalar = grumpkin::Scalar;
}

impl PrimeFieldExt for grumpkin::Scalar {
  fn from_uniform(bytes: &[u8]) -> Self {
    let mut wide = [0u8; 64];
    let len = bytes.len().min(64);
    wide[..len].copy_from_slice(&bytes[..len]);
    grumpkin::Scalar::from_uniform_bytes(&wide)
  }
}

impl<G: Group> TranscriptReprTrait<G> for grumpkin::Scalar {
  fn to_transcript_bytes(&self) -> Vec<u8> {
    self.to_repr().as_ref().to_vec()
  }
}

impl DlogGroup for grumpkin::Point {
  type Affine = grumpkin::Affine;

  fn from_label(label: &'static [u8], n: usize) -> Vec<Self::Affine> {
    let mut shake = Shake256::default();
    shake.update(label);
    let mut reader = shake.finalize_xof();
    let uniform_bytes_vec = (0..n)
      .map(|_| {
        let mut uniform_bytes = [0u8; 32];
        reader.read(&mut uniform_bytes);
        uniform_bytes
      })
      .collect::<Vec<_>>();

    let projective = uniform_bytes_vec
      .par_iter()
      .map(|uniform_bytes| {
        let hash = grumpkin::Point::hash_to_curve("from_uniform_bytes");
        hash(uniform_bytes)
      })
      .collect::<Vec<_>>();

    let mut affine = vec![grumpkin::Affine::identity(); n];
    grumpkin::Point::batch_normalize(&projective, &mut affine);
    affine
  }
}
