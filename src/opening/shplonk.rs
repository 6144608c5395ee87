//! Shplonk: batches univariate opening claims `(p_i, z_i, v_i)` into a single claim at a fresh
//! point `z`.
//!
//! The prover commits to `Q = sum_i nu^i (p_i - v_i) / (X - z_i)` and, once `z` is drawn, opens
//! `G = Q - sum_i nu^i / (z - z_i) p_i` at `z`, where it must equal
//! `-sum_i nu^i v_i / (z - z_i)`. The verifier derives `[G]` from `[Q]` and the `[p_i]`.
use crate::{
  errors::HonkError,
  opening::{OpeningClaim, OpeningPair, VerifierOpeningClaim},
  polys::univariate::{UniPoly, batch_invert},
  traits::{Engine, pcs::PCSEngineTrait, transcript::powers},
  transcript::VerifierTranscript,
};
use ff::{Field, PrimeField};

/// Label of the batching challenge
pub const NU_LABEL: &str = "Shplonk:nu";
/// Label of the commitment to the batched quotient
pub const Q_LABEL: &str = "Shplonk:Q";
/// Label of the final evaluation challenge
pub const Z_LABEL: &str = "Shplonk:z";

/// Groups claim indices by evaluation point, in order of first occurrence
fn group_by_point<F: PrimeField>(points: impl Iterator<Item = F>) -> Vec<(F, Vec<usize>)> {
  let mut groups: Vec<(F, Vec<usize>)> = Vec::new();
  for (i, point) in points.enumerate() {
    match groups.iter_mut().find(|(p, _)| *p == point) {
      Some((_, members)) => members.push(i),
      None => groups.push((point, vec![i])),
    }
  }
  groups
}

/// `nu^i / (z - z_i)` for every claim
fn inverse_vanishing_scalars<F: PrimeField>(points: &[F], nu: &F, z: &F) -> Result<Vec<F>, HonkError> {
  let mut denominators = points.iter().map(|z_i| *z - z_i).collect::<Vec<_>>();
  batch_invert(&mut denominators)?;
  Ok(
    denominators
      .into_iter()
      .zip(powers(nu, points.len()))
      .map(|(inv, nu_i)| inv * nu_i)
      .collect(),
  )
}

/// Prover side of Shplonk
pub struct ShplonkProver;

impl ShplonkProver {
  /// Computes `Q = sum_i nu^i (p_i - v_i) / (X - z_i)`.
  ///
  /// Numerators sharing a point are summed before a single division by `X - z_i`.
  pub fn compute_batched_quotient<F: PrimeField>(
    claims: &[OpeningClaim<F>],
    nu: &F,
  ) -> Result<Vec<F>, HonkError> {
    if claims.is_empty() {
      return Err(HonkError::InvalidInputLength);
    }
    let nu_powers = powers(nu, claims.len());
    let max_len = claims.iter().map(|c| c.polynomial.len()).max().unwrap_or(0);
    let mut quotient = UniPoly::new(vec![F::ZERO; max_len.saturating_sub(1)]);

    for (point, members) in group_by_point(claims.iter().map(|c| c.opening_pair.challenge)) {
      let mut numerator = UniPoly::new(Vec::new());
      let mut constant = F::ZERO;
      for i in members {
        numerator.add_scaled(&nu_powers[i], &claims[i].polynomial);
        constant += nu_powers[i] * claims[i].opening_pair.evaluation;
      }
      let mut coeffs = numerator.into_coeffs();
      if coeffs.is_empty() {
        coeffs.push(F::ZERO);
      }
      coeffs[0] -= constant;

      let (q, remainder) = UniPoly::new(coeffs).divide_by_linear(&point);
      if remainder != F::ZERO {
        return Err(HonkError::InvalidPCS);
      }
      quotient.add_scaled(&F::ONE, q.coeffs());
    }
    Ok(quotient.into_coeffs())
  }

  /// Forms `G = Q - sum_i nu^i / (z - z_i) p_i` and its claimed value at `z`.
  pub fn compute_partially_evaluated_batched_quotient<F: PrimeField>(
    claims: &[OpeningClaim<F>],
    batched_quotient: Vec<F>,
    nu: &F,
    z: &F,
  ) -> Result<OpeningClaim<F>, HonkError> {
    let points = claims
      .iter()
      .map(|c| c.opening_pair.challenge)
      .collect::<Vec<_>>();
    let scalars = inverse_vanishing_scalars(&points, nu, z)?;

    let mut g = UniPoly::new(batched_quotient);
    let mut evaluation = F::ZERO;
    for (claim, scalar) in claims.iter().zip(scalars) {
      g.add_scaled(&-scalar, &claim.polynomial);
      evaluation -= scalar * claim.opening_pair.evaluation;
    }

    Ok(OpeningClaim {
      polynomial: g.into_coeffs(),
      opening_pair: OpeningPair {
        challenge: *z,
        evaluation,
      },
    })
  }
}

/// Verifier side of Shplonk
pub struct ShplonkVerifier;

impl ShplonkVerifier {
  /// Reads `[Q]` from the transcript and reduces `claims` to one claim at `z`.
  pub fn reduce_verification<E: Engine>(
    transcript: &mut VerifierTranscript<'_, E>,
    claims: &[VerifierOpeningClaim<E>],
  ) -> Result<VerifierOpeningClaim<E>, HonkError> {
    if claims.is_empty() {
      return Err(HonkError::InvalidInputLength);
    }
    let nu = transcript.get_challenge(NU_LABEL)?;
    let q = transcript.receive_commitment(Q_LABEL)?;
    let z = transcript.get_challenge(Z_LABEL)?;

    let points = claims
      .iter()
      .map(|c| c.opening_pair.challenge)
      .collect::<Vec<_>>();
    let scalars = inverse_vanishing_scalars(&points, &nu, &z)?;

    let mut comms = Vec::with_capacity(claims.len() + 1);
    let mut coeffs = Vec::with_capacity(claims.len() + 1);
    comms.push(q);
    coeffs.push(E::Scalar::ONE);
    let mut evaluation = E::Scalar::ZERO;
    for (claim, scalar) in claims.iter().zip(scalars) {
      comms.push(claim.commitment.clone());
      coeffs.push(-scalar);
      evaluation -= scalar * claim.opening_pair.evaluation;
    }

    Ok(VerifierOpeningClaim {
      commitment: E::PCS::combine(&comms, &coeffs)?,
      opening_pair: OpeningPair {
        challenge: z,
        evaluation,
      },
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::provider::bn256::bn256;
  use rand::{SeedableRng, rngs::StdRng};

  type F = bn256::Scalar;

  fn claim(rng: &mut StdRng, len: usize, point: F) -> OpeningClaim<F> {
    let polynomial = (0..len).map(|_| F::random(&mut *rng)).collect::<Vec<_>>();
    let evaluation = UniPoly::new(polynomial.clone()).evaluate(&point);
    OpeningClaim {
      polynomial,
      opening_pair: OpeningPair {
        challenge: point,
        evaluation,
      },
    }
  }

  fn check_batched_claim(claims: &[OpeningClaim<F>], rng: &mut StdRng) {
    let nu = F::random(&mut *rng);
    let z = F::random(&mut *rng);
    let q = ShplonkProver::compute_batched_quotient(claims, &nu).unwrap();

    // Q(X) (X - z_i) relation, checked at z
    let nu_powers = powers(&nu, claims.len());
    let expected_q_at_z = claims
      .iter()
      .zip(&nu_powers)
      .map(|(c, nu_i)| {
        *nu_i * (UniPoly::new(c.polynomial.clone()).evaluate(&z) - c.opening_pair.evaluation)
          * (z - c.opening_pair.challenge).invert().unwrap()
      })
      .sum::<F>();
    assert_eq!(UniPoly::new(q.clone()).evaluate(&z), expected_q_at_z);

    let g = ShplonkProver::compute_partially_evaluated_batched_quotient(claims, q, &nu, &z).unwrap();
    assert_eq!(g.opening_pair.challenge, z);
    assert_eq!(
      UniPoly::new(g.polynomial).evaluate(&z),
      g.opening_pair.evaluation
    );
  }

  #[test]
  fn test_shared_point() {
    let mut rng = StdRng::seed_from_u64(7);
    let point = F::random(&mut rng);
    let claims = vec![
      claim(&mut rng, 8, point),
      claim(&mut rng, 4, point),
      claim(&mut rng, 8, point),
    ];
    check_batched_claim(&claims, &mut rng);
  }

  #[test]
  fn test_distinct_points() {
    let mut rng = StdRng::seed_from_u64(8);
    let r = F::random(&mut rng);
    let claims = vec![
      claim(&mut rng, 8, r),
      claim(&mut rng, 8, -r),
      claim(&mut rng, 4, -r.square()),
      claim(&mut rng, 2, -r.square().square()),
      claim(&mut rng, 4, r),
    ];
    check_batched_claim(&claims, &mut rng);
  }

  #[test]
  fn test_false_claim_is_rejected() {
    let mut rng = StdRng::seed_from_u64(9);
    let mut bad = claim(&mut rng, 8, F::from(3u64));
    bad.opening_pair.evaluation += F::ONE;
    assert_eq!(
      ShplonkProver::compute_batched_quotient(&[bad], &F::from(5u64)),
      Err(HonkError::InvalidPCS)
    );
  }

  #[test]
  fn test_z_at_claim_point_is_division_by_zero() {
    let mut rng = StdRng::seed_from_u64(10);
    let point = F::from(11u64);
    let claims = vec![claim(&mut rng, 4, point)];
    let q = ShplonkProver::compute_batched_quotient(&claims, &F::ONE).unwrap();
    assert_eq!(
      ShplonkProver::compute_partially_evaluated_batched_quotient(&claims, q, &F::ONE, &point),
      Err(HonkError::DivisionByZero)
    );
  }
}
