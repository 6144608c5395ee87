// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the UltraHonk prover project.
// See the LICENSE file in the project root for full license information.

//! This module implements the library's group traits for BN254 (also known as BN256 or alt_bn128).
use crate::{
  provider::traits::PairingGroup,
  traits::{Group, PrimeFieldExt, transcript::TranscriptReprTrait},
};
use ff::{FromUniformBytes, PrimeField};
use group::{Curve, prime::PrimeCurveAffine};
use halo2curves::pairing::Engine as PairingEngine;

/// Re-exports that give access to the standard aliases used in the code base, for bn256
#[allow(clippy::module_inception)]
pub mod bn256 {
  pub use halo2curves::bn256::{
    Bn256, Fq as Base, Fr as Scalar, G1 as Point, G1Affine as Affine, G2Affine, Gt,
  };
}

impl Group for bn256::Point {
  type Scalar = bn256::Scalar;
}

impl PrimeFieldExt for bn256::Scalar {
  fn from_uniform(bytes: &[u8]) -> Self {
    // transcript outputs are 64 bytes; shorter inputs are zero-extended
    let mut wide = [0u8; 64];
    let len = bytes.len().min(64);
    wide[..len].copy_from_slice(&bytes[..len]);
    bn256::Scalar::from_uniform_bytes(&wide)
  }
}

impl<G: Group> TranscriptReprTrait<G> for bn256::Scalar {
  fn to_transcript_bytes(&self) -> Vec<u8> {
    self.to_repr().as_ref().to_vec()
  }
}

impl PairingGroup for bn256::Point {
  type G1Affine = bn256::Affine;
  type G2Affine = bn256::G2Affine;
  type GT = bn256::Gt;

  fn g1_generator() -> Self::G1Affine {
    <bn256::Affine as PrimeCurveAffine>::generator()
  }

  fn g2_generator() -> Self::G2Affine {
    <bn256::G2Affine as PrimeCurveAffine>::generator()
  }

  fn g2_mul_generator(s: &Self::Scalar) -> Self::G2Affine {
    (Self::g2_generator() * s).to_affine()
  }

  fn pairing(p: &Self::G1Affine, q: &Self::G2Affine) -> Self::GT {
    bn256::Bn256::pairing(p, q)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ff::Field;
  use rand::{SeedableRng, rngs::StdRng};

  #[test]
  fn test_pairing_is_bilinear() {
    let mut rng = StdRng::seed_from_u64(11);
    let a = bn256::Scalar::random(&mut rng);
    let b = bn256::Scalar::random(&mut rng);

    let g1 = <bn256::Point as PairingGroup>::g1_generator();
    let a_g1 = (g1 * a).to_affine();
    let b_g2 = <bn256::Point as PairingGroup>::g2_mul_generator(&b);
    let ab_g1 = (g1 * (a * b)).to_affine();
    let g2 = <bn256::Point as PairingGroup>::g2_generator();

    assert_eq!(
      <bn256::Point as PairingGroup>::pairing(&a_g1, &b_g2),
      <bn256::Point as PairingGroup>::pairing(&ab_g1, &g2)
    );
  }

  #[test]
  fn test_from_uniform_is_deterministic() {
    let bytes = [7u8; 64];
    assert_eq!(
      bn256::Scalar::from_uniform(&bytes),
      bn256::Scalar::from_uniform(&bytes)
    );
    assert_ne!(
      bn256::Scalar::from_uniform(&bytes),
      bn256::Scalar::from_uniform(&[8u8; 64])
    );
  }
}
