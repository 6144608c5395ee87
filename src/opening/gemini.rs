//! Gemini: reduces the evaluation of a batched multilinear polynomial at `u` to univariate
//! openings.
//!
//! The hypercube table of a multilinear polynomial is read as the coefficient vector of a
//! univariate one. With `A_0 = F + G / X`, where `F` batches the unshifted columns and `G`
//! the to-be-shifted ones, each fold
//!
//! `A_{l+1}(X^2) = (1 - u_l) (A_l(X) + A_l(-X)) / 2 + u_l (A_l(X) - A_l(-X)) / (2X)`
//!
//! binds one variable, and the constant `A_d` is the batched multilinear evaluation. The
//! verifier checks the folds at `r^{2^l}` from the sent values `A_l(-r^{2^l})`.
use crate::{
  errors::HonkError,
  opening::{OpeningClaim, OpeningPair, VerifierOpeningClaim},
  polys::{
    multilinear::bind_bot,
    univariate::{UniPoly, batch_invert, div_f},
  },
  proof::ProofElement,
  traits::{Engine, pcs::PCSEngineTrait},
  transcript::VerifierTranscript,
};
use ff::{Field, PrimeField};
use rayon::prelude::*;

/// Label of the commitment to fold polynomial `A_l`, for `l >= 1`
pub fn fold_label(l: usize) -> String {
  format!("Gemini:FOLD_{l}")
}

/// Label of the evaluation `A_l(-r^{2^l})`
pub fn evaluation_label(l: usize) -> String {
  format!("Gemini:a_{l}")
}

/// Label of the evaluation challenge
pub const R_LABEL: &str = "Gemini:r";

/// The `d + 1` univariate claims produced by the prover, consumed once by the batching round
#[derive(Clone, Debug)]
pub struct GeminiProverOutput<F: PrimeField> {
  /// `(A_0+, r)`, `(A_0-, -r)`, then `(A_l, -r^{2^l})` for `l = 1..d-1`
  pub opening_claims: Vec<OpeningClaim<F>>,
}

/// Prover side of Gemini
pub struct GeminiProver;

impl GeminiProver {
  /// Computes `[F, G, A_1, ..., A_{d-1}]` from the batched polynomials.
  ///
  /// `batched_to_be_shifted` must vanish at index 0 so that `G / X` is a polynomial.
  pub fn compute_fold_polynomials<F: PrimeField>(
    u: &[F],
    batched_unshifted: Vec<F>,
    batched_to_be_shifted: Vec<F>,
  ) -> Result<Vec<Vec<F>>, HonkError> {
    let n = batched_unshifted.len();
    let d = u.len();
    if n != 1 << d || batched_to_be_shifted.len() != n || d < 1 {
      return Err(HonkError::InvalidInputLength);
    }

    // A_0 = F + G / X
    let mut a_0 = batched_unshifted.clone();
    a_0[..n - 1]
      .par_iter_mut()
      .zip(batched_to_be_shifted[1..].par_iter())
      .for_each(|(a, g)| *a += g);

    let mut fold_polynomials = Vec::with_capacity(d + 1);
    fold_polynomials.push(batched_unshifted);
    fold_polynomials.push(batched_to_be_shifted);

    let mut current = a_0;
    for u_l in &u[..d - 1] {
      current = bind_bot(&current, u_l);
      fold_polynomials.push(current.clone());
    }
    Ok(fold_polynomials)
  }

  /// Forms `A_0+ = F + G / r` and `A_0- = F - G / r` and evaluates every fold polynomial at
  /// its opening point.
  pub fn compute_fold_polynomial_evaluations<F: PrimeField>(
    u: &[F],
    fold_polynomials: Vec<Vec<F>>,
    r: &F,
  ) -> Result<GeminiProverOutput<F>, HonkError> {
    let d = u.len();
    if fold_polynomials.len() != d + 1 {
      return Err(HonkError::InvalidInputLength);
    }
    let r_inv = div_f(F::ONE, *r)?;

    let mut polys = fold_polynomials.into_iter();
    let (Some(batched_f), Some(batched_g)) = (polys.next(), polys.next()) else {
      return Err(HonkError::InvalidInputLength);
    };

    let mut a_0_pos = UniPoly::new(batched_f.clone());
    a_0_pos.add_scaled(&r_inv, &batched_g);
    let mut a_0_neg = UniPoly::new(batched_f);
    a_0_neg.add_scaled(&-r_inv, &batched_g);

    let mut opening_claims = Vec::with_capacity(d + 1);
    opening_claims.push(OpeningClaim {
      opening_pair: OpeningPair {
        challenge: *r,
        evaluation: a_0_pos.evaluate(r),
      },
      polynomial: a_0_pos.into_coeffs(),
    });
    opening_claims.push(OpeningClaim {
      opening_pair: OpeningPair {
        challenge: -*r,
        evaluation: a_0_neg.evaluate(&-*r),
      },
      polynomial: a_0_neg.into_coeffs(),
    });

    let mut r_squared = r.square();
    for a_l in polys {
      let point = -r_squared;
      opening_claims.push(OpeningClaim {
        opening_pair: OpeningPair {
          challenge: point,
          evaluation: UniPoly::new(a_l.clone()).evaluate(&point),
        },
        polynomial: a_l,
      });
      r_squared = r_squared.square();
    }

    Ok(GeminiProverOutput { opening_claims })
  }
}

/// Returns `[r, r^2, r^4, ..., r^{2^{d-1}}]`.
pub fn powers_of_evaluation_challenge<F: PrimeField>(r: &F, d: usize) -> Vec<F> {
  let mut out = Vec::with_capacity(d);
  let mut cur = *r;
  for _ in 0..d {
    out.push(cur);
    cur = cur.square();
  }
  out
}

/// Recovers `A_0(r)` from the batched evaluation `A_d = v` and the sent values
/// `a_l = A_l(-r^{2^l})`.
pub fn compute_gemini_batched_univariate_evaluation<F: PrimeField>(
  u: &[F],
  batched_evaluation: &F,
  fold_evaluations: &[F],
  r_squares: &[F],
) -> Result<F, HonkError> {
  let d = u.len();
  if fold_evaluations.len() != d || r_squares.len() != d {
    return Err(HonkError::InvalidInputLength);
  }

  let two = F::from(2u64);
  let mut denominators = (0..d)
    .map(|l| (F::ONE - u[l]) * r_squares[l] + u[l])
    .collect::<Vec<_>>();
  batch_invert(&mut denominators)?;

  let mut eval_pos = *batched_evaluation;
  for l in (0..d).rev() {
    let x = r_squares[l];
    let a_neg = fold_evaluations[l];
    eval_pos = (two * x * eval_pos - a_neg * ((F::ONE - u[l]) * x - u[l])) * denominators[l];
  }
  Ok(eval_pos)
}

/// Verifier side of Gemini
pub struct GeminiVerifier;

impl GeminiVerifier {
  /// Reads the fold commitments and evaluations from the transcript and returns the `d + 1`
  /// univariate claims they imply.
  pub fn reduce_verification<E: Engine>(
    transcript: &mut VerifierTranscript<'_, E>,
    u: &[E::Scalar],
    batched_evaluation: &E::Scalar,
    batched_commitment_unshifted: &crate::Commitment<E>,
    batched_commitment_to_be_shifted: &crate::Commitment<E>,
  ) -> Result<Vec<VerifierOpeningClaim<E>>, HonkError> {
    let d = u.len();
    let fold_commitments = (1..d)
      .map(|l| transcript.receive_commitment(&fold_label(l)))
      .collect::<Result<Vec<_>, _>>()?;
    let r = transcript.get_challenge(R_LABEL)?;
    let fold_evaluations = (0..d)
      .map(|l| transcript.receive_scalar(&evaluation_label(l)))
      .collect::<Result<Vec<_>, _>>()?;

    let r_squares = powers_of_evaluation_challenge(&r, d);
    let a_0_pos =
      compute_gemini_batched_univariate_evaluation(u, batched_evaluation, &fold_evaluations, &r_squares)?;

    let r_inv = div_f(E::Scalar::ONE, r)?;
    let batched = [
      batched_commitment_unshifted.clone(),
      batched_commitment_to_be_shifted.clone(),
    ];
    let c_pos = E::PCS::combine(&batched, &[E::Scalar::ONE, r_inv])?;
    let c_neg = E::PCS::combine(&batched, &[E::Scalar::ONE, -r_inv])?;

    let mut claims = Vec::with_capacity(d + 1);
    claims.push(VerifierOpeningClaim {
      commitment: c_pos,
      opening_pair: OpeningPair {
        challenge: r,
        evaluation: a_0_pos,
      },
    });
    claims.push(VerifierOpeningClaim {
      commitment: c_neg,
      opening_pair: OpeningPair {
        challenge: -r,
        evaluation: fold_evaluations[0],
      },
    });
    for (l, commitment) in fold_commitments.into_iter().enumerate() {
      claims.push(VerifierOpeningClaim {
        commitment,
        opening_pair: OpeningPair {
          challenge: -r_squares[l + 1],
          evaluation: fold_evaluations[l + 1],
        },
      });
    }
    Ok(claims)
  }
}

/// Sends `A_l(-r^{2^l})` for `l = 0..d-1` as the prover's evaluation messages.
pub fn evaluation_messages<E: Engine>(
  output: &GeminiProverOutput<E::Scalar>,
) -> Vec<(String, ProofElement<E>)> {
  output
    .opening_claims
    .iter()
    .skip(1)
    .enumerate()
    .map(|(l, claim)| {
      (
        evaluation_label(l),
        ProofElement::Scalar(claim.opening_pair.evaluation),
      )
    })
    .collect()
}
