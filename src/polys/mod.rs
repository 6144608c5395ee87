//! This module contains the polynomial types used by the prover and verifier.
pub mod multilinear;
pub mod power;
pub mod univariate;
