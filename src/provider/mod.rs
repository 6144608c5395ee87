//! This module implements the library's traits for concrete curves and commitment schemes

// public modules to be used as a flavor with the prover
pub mod bn256;
pub mod grumpkin;
pub mod pcs;

pub(crate) mod keccak;
pub(crate) mod traits;

mod msm;

use crate::{
  provider::{
    bn256::bn256 as bn,
    grumpkin::grumpkin as gk,
    keccak::Keccak256Transcript,
    pcs::{ipa_pc::IPAPCS, kzg_pc::KZGPCS},
  },
  traits::Engine,
};
use serde::{Deserialize, Serialize};

/// An implementation of the `Engine` trait with the BN254 curve, a Keccak256 transcript and
/// KZG commitments
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Bn256EngineKZG;

impl Engine for Bn256EngineKZG {
  type Scalar = bn::Scalar;
  type GE = bn::Point;
  type TE = Keccak256Transcript<Self>;
  type PCS = KZGPCS<Self>;
}

/// An implementation of the `Engine` trait with the Grumpkin curve, a Keccak256 transcript and
/// a transparent IPA commitment scheme
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GrumpkinEngineIPA;

impl Engine for GrumpkinEngineIPA {
  type Scalar = gk::Scalar;
  type GE = gk::Point;
  type TE = Keccak256Transcript<Self>;
  type PCS = IPAPCS<Self>;
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::traits::{pcs::PCSEngineTrait, transcript::TranscriptEngineTrait};
  use ff::Field;

  fn round_trip_opening<E: Engine>() {
    let (ck, vk) = <E as Engine>::PCS::setup(b"engine", 4);
    let coeffs = vec![
      E::Scalar::ONE,
      E::Scalar::from(2u64),
      E::Scalar::from(3u64),
    ];
    let comm = <E as Engine>::PCS::commit(&ck, &coeffs).unwrap();
    let point = E::Scalar::from(5u64);

    let mut pt = <E as Engine>::TE::new(b"engine");
    let (eval, arg) = <E as Engine>::PCS::prove(&ck, &mut pt, &coeffs, &point).unwrap();
    // 1 + 2 * 5 + 3 * 25
    assert_eq!(eval, E::Scalar::from(86u64));

    let mut vt = <E as Engine>::TE::new(b"engine");
    <E as Engine>::PCS::verify(&vk, &mut vt, &comm, &point, &eval, &arg).unwrap();
  }

  #[test]
  fn test_engine_round_trip_opening() {
    round_trip_opening::<Bn256EngineKZG>();
    round_trip_opening::<GrumpkinEngineIPA>();
  }
}
