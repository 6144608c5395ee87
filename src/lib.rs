//! This library implements the prover of UltraHonk, a Plonkish SNARK whose relation check is
//! a sumcheck over the boolean hypercube.
//!
//! The prover is a round sequencer ([`prover::UltraProver`]) over a Fiat-Shamir transcript
//! ([`transcript`]). Commitments are computed through a deferred work queue ([`queue`]), the
//! relation check reduces to multilinear evaluation claims ([`sumcheck`]), and those claims
//! are reduced to one univariate opening by Gemini folding and Shplonk batching
//! ([`opening`]). The crate is generic over the commitment scheme through [`traits::Engine`];
//! [`provider::Bn256EngineKZG`] instantiates it with BN254 and KZG, and
//! [`provider::GrumpkinEngineIPA`] with Grumpkin and a transparent inner product argument.
#![deny(
  future_incompatible,
  nonstandard_style,
  rust_2018_idioms,
  missing_docs
)]
#![allow(non_snake_case)]
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::type_complexity)]
#![forbid(unsafe_code)]

// private modules
mod math;

// public modules
pub mod circuit;
pub mod composer;
pub mod digest;
pub mod errors;
pub mod flavor;
pub mod opening;
pub mod polys;
pub mod proof;
pub mod prover;
pub mod provider;
pub mod queue;
pub mod relations;
pub mod sumcheck;
pub mod traits;
pub mod transcript;
pub mod verifier;

/// Start a span + timer, return `(Span, Instant)`.
macro_rules! start_span {
    ($name:expr $(, $($fmt:tt)+)?) => {{
        let span       = info_span!($name $(, $($fmt)+)?);
        let span_clone = span.clone();    // lives as long as the guard
        let _guard      = span_clone.enter();
        (span, Instant::now())
    }};
}
pub(crate) use start_span;

use traits::{Engine, pcs::PCSEngineTrait};
type CommitmentKey<E> = <<E as traits::Engine>::PCS as PCSEngineTrait<E>>::CommitmentKey;
type VerifierKey<E> = <<E as traits::Engine>::PCS as PCSEngineTrait<E>>::VerifierKey;
type Commitment<E> = <<E as Engine>::PCS as PCSEngineTrait<E>>::Commitment;
type EvaluationArgument<E> = <<E as Engine>::PCS as PCSEngineTrait<E>>::EvaluationArgument;
