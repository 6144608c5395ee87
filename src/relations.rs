//! The Ultra relations checked by the sumcheck.
//!
//! Each relation contributes one or more subrelations. A subrelation is a polynomial in the
//! column values of a single row (and, through the shifted views, the next row) that must
//! vanish on every row of a satisfied trace. Subrelations are batched with powers of the
//! separator challenge `alpha` in the order arithmetic, permutation, lookup.
use crate::{
  errors::HonkError,
  flavor::{AllValues, Entity, NUM_WIRES},
  polys::univariate::batch_invert,
};
use ff::{Field, PrimeField};
use serde::{Deserialize, Serialize};

/// Number of subrelations across all relations
pub const NUM_SUBRELATIONS: usize = ArithmeticRelation::NUM_SUBRELATIONS
  + PermutationRelation::NUM_SUBRELATIONS
  + LookupRelation::NUM_SUBRELATIONS;

/// Largest total degree of any subrelation
pub const MAX_RELATION_DEGREE: usize = 5;

/// Number of evaluations sent per sumcheck round: the relation degree plus one for the
/// `pow` factor, plus one
pub const BATCHED_RELATION_LENGTH: usize = MAX_RELATION_DEGREE + 2;

/// Challenges and derived constants the relations are parameterized by
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationParameters<F: PrimeField> {
  /// Compresses the three wire values and table id of a lookup into one field element
  pub eta: F,
  /// Grand-product challenge
  pub beta: F,
  /// Grand-product challenge
  pub gamma: F,
  /// Correction of the permutation grand product for public inputs
  pub public_input_delta: F,
  /// Value of the lookup grand product in the last row
  pub lookup_grand_product_delta: F,
}

/// A relation over the values of one row
pub trait Relation<F: PrimeField> {
  /// Adds `scaling_factor` times each subrelation's value at `row` into `evals`.
  fn accumulate(
    evals: &mut [F],
    row: &AllValues<F>,
    params: &RelationParameters<F>,
    scaling_factor: &F,
  );
}

/// Standard Plonk gate with a fourth wire:
/// `q_arith * (q_m w_l w_r + q_l w_l + q_r w_r + q_o w_o + q_4 w_4 + q_c)`
pub struct ArithmeticRelation;

/// Copy constraints through the grand product `z_perm`
pub struct PermutationRelation;

/// Plookup table membership through the grand product `z_lookup`
pub struct LookupRelation;

impl ArithmeticRelation {
  /// Number of subrelations
  pub const NUM_SUBRELATIONS: usize = 1;
}

impl PermutationRelation {
  /// Number of subrelations: the grand-product step and `z_perm_shift = 0` on the last row
  pub const NUM_SUBRELATIONS: usize = 2;
}

impl LookupRelation {
  /// Number of subrelations: the grand-product step and `z_lookup_shift = 0` on the last row
  pub const NUM_SUBRELATIONS: usize = 2;
}

impl<F: PrimeField> Relation<F> for ArithmeticRelation {
  fn accumulate(
    evals: &mut [F],
    row: &AllValues<F>,
    _params: &RelationParameters<F>,
    scaling_factor: &F,
  ) {
    let w_l = row[Entity::W1];
    let w_r = row[Entity::W2];
    let gate = row[Entity::QM] * w_l * w_r
      + row[Entity::QL] * w_l
      + row[Entity::QR] * w_r
      + row[Entity::QO] * row[Entity::W3]
      + row[Entity::Q4] * row[Entity::W4]
      + row[Entity::QC];
    evals[0] += gate * row[Entity::QArith] * scaling_factor;
  }
}

impl<F: PrimeField> Relation<F> for PermutationRelation {
  fn accumulate(
    evals: &mut [F],
    row: &AllValues<F>,
    params: &RelationParameters<F>,
    scaling_factor: &F,
  ) {
    let (numerator, denominator) = permutation_factors(row, params);
    let z_perm = row[Entity::ZPerm];
    let z_perm_shift = row[Entity::ZPermShift];
    let l_first = row[Entity::LagrangeFirst];
    let l_last = row[Entity::LagrangeLast];

    evals[0] += ((z_perm + l_first) * numerator
      - (z_perm_shift + l_last * params.public_input_delta) * denominator)
      * scaling_factor;
    evals[1] += l_last * z_perm_shift * scaling_factor;
  }
}

impl<F: PrimeField> Relation<F> for LookupRelation {
  fn accumulate(
    evals: &mut [F],
    row: &AllValues<F>,
    params: &RelationParameters<F>,
    scaling_factor: &F,
  ) {
    let (numerator, denominator) = lookup_factors(row, params);
    let z_lookup = row[Entity::ZLookup];
    let z_lookup_shift = row[Entity::ZLookupShift];
    let l_first = row[Entity::LagrangeFirst];
    let l_last = row[Entity::LagrangeLast];

    evals[0] += ((z_lookup + l_first) * numerator
      - (z_lookup_shift + l_last * params.lookup_grand_product_delta) * denominator)
      * scaling_factor;
    evals[1] += l_last * z_lookup_shift * scaling_factor;
  }
}

/// Per-row numerator `prod_k (w_k + beta id_k + gamma)` and denominator
/// `prod_k (w_k + beta sigma_k + gamma)` of the permutation grand product.
pub fn permutation_factors<F: PrimeField>(row: &AllValues<F>, params: &RelationParameters<F>) -> (F, F) {
  (0..NUM_WIRES).fold((F::ONE, F::ONE), |(num, den), k| {
    let w = row[Entity::WIRES[k]] + params.gamma;
    (
      num * (w + params.beta * row[Entity::IDS[k]]),
      den * (w + params.beta * row[Entity::SIGMAS[k]]),
    )
  })
}

/// Per-row numerator and denominator of the plookup grand product:
/// `(1 + beta)(q_lookup f + gamma)(t + beta t_shift + gamma (1 + beta))` over
/// `s + beta s_shift + gamma (1 + beta)`.
pub fn lookup_factors<F: PrimeField>(row: &AllValues<F>, params: &RelationParameters<F>) -> (F, F) {
  let eta = params.eta;
  let one_plus_beta = F::ONE + params.beta;
  let gamma_by_one_plus_beta = params.gamma * one_plus_beta;

  // the constant selector carries the table id on lookup rows
  let f = compress(
    eta,
    [
      row[Entity::W1],
      row[Entity::W2],
      row[Entity::W3],
      row[Entity::QC],
    ],
  );
  let t = compress(eta, Entity::TABLES.map(|e| row[e]));
  let t_shift = compress(
    eta,
    [
      row[Entity::Table1Shift],
      row[Entity::Table2Shift],
      row[Entity::Table3Shift],
      row[Entity::Table4Shift],
    ],
  );

  let numerator = one_plus_beta
    * (row[Entity::QLookup] * f + params.gamma)
    * (t + params.beta * t_shift + gamma_by_one_plus_beta);
  let denominator = row[Entity::SortedAccum]
    + params.beta * row[Entity::SortedAccumShift]
    + gamma_by_one_plus_beta;
  (numerator, denominator)
}

/// Returns `v_0 + eta v_1 + eta^2 v_2 + eta^3 v_3`.
pub fn compress<F: Field>(eta: F, v: [F; NUM_WIRES]) -> F {
  v.iter().rev().fold(F::ZERO, |acc, x| acc * eta + x)
}

/// Evaluates every subrelation at `row`, scaled by `scaling_factor`.
pub fn accumulate_all_relations<F: PrimeField>(
  row: &AllValues<F>,
  params: &RelationParameters<F>,
  scaling_factor: &F,
) -> [F; NUM_SUBRELATIONS] {
  let mut evals = [F::ZERO; NUM_SUBRELATIONS];
  let (arith, rest) = evals.split_at_mut(ArithmeticRelation::NUM_SUBRELATIONS);
  let (perm, lookup) = rest.split_at_mut(PermutationRelation::NUM_SUBRELATIONS);
  <ArithmeticRelation as Relation<F>>::accumulate(arith, row, params, scaling_factor);
  <PermutationRelation as Relation<F>>::accumulate(perm, row, params, scaling_factor);
  <LookupRelation as Relation<F>>::accumulate(lookup, row, params, scaling_factor);
  evals
}

/// Batches subrelation values with separators `[1, alpha, alpha^2, ...]`.
pub fn batch_subrelations<F: PrimeField>(evals: &[F; NUM_SUBRELATIONS], alphas: &[F]) -> F {
  evals.iter().zip(alphas.iter()).map(|(e, a)| *e * a).sum()
}

/// Computes `prod_i (x_i + gamma + beta (n + offset + i)) / (x_i + gamma - beta (offset + i + 1))`.
///
/// Public input `i` sits in the right wire of row `offset + i`, and that cell is wired to
/// the negated index `-(offset + i + 1)`. The product above is the factor by which the
/// permutation grand product misses one as a result.
///
/// # Errors
/// Returns `HonkError::DivisionByZero` if any denominator vanishes.
pub fn compute_public_input_delta<F: PrimeField>(
  public_inputs: &[F],
  beta: &F,
  gamma: &F,
  circuit_size: usize,
  offset: usize,
) -> Result<F, HonkError> {
  let mut numerator = F::ONE;
  let mut denominators = Vec::with_capacity(public_inputs.len());
  let mut numerator_acc = *gamma + *beta * F::from((circuit_size + offset) as u64);
  let mut denominator_acc = *gamma - *beta * F::from((offset + 1) as u64);
  for x in public_inputs {
    numerator *= numerator_acc + x;
    denominators.push(denominator_acc + x);
    numerator_acc += beta;
    denominator_acc -= beta;
  }
  batch_invert(&mut denominators)?;
  Ok(denominators.into_iter().fold(numerator, |acc, d| acc * d))
}

/// Computes `(gamma (1 + beta))^n`, the final value of the lookup grand product's
/// complement for a trace whose padding rows are all zero.
pub fn compute_lookup_grand_product_delta<F: PrimeField>(beta: &F, gamma: &F, circuit_size: usize) -> F {
  (*gamma * (F::ONE + beta)).pow_vartime([circuit_size as u64])
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{flavor::AllEntities, provider::bn256::bn256};
  use rand::{SeedableRng, rngs::StdRng};

  type F = bn256::Scalar;

  fn zero_row() -> AllValues<F> {
    AllEntities::splat(F::ZERO)
  }

  #[test]
  fn test_arithmetic_relation() {
    // 2 * 3 - 6 = 0 as q_m w_l w_r + q_o w_o
    let mut row = zero_row();
    row[Entity::QArith] = F::ONE;
    row[Entity::QM] = F::ONE;
    row[Entity::QO] = -F::ONE;
    row[Entity::W1] = F::from(2);
    row[Entity::W2] = F::from(3);
    row[Entity::W3] = F::from(6);

    let params = RelationParameters::default();
    let evals = accumulate_all_relations(&row, &params, &F::ONE);
    assert_eq!(evals[0], F::ZERO);

    row[Entity::W3] = F::from(7);
    let evals = accumulate_all_relations(&row, &params, &F::from(5));
    assert_eq!(evals[0], -F::from(5));

    // a disabled gate contributes nothing
    row[Entity::QArith] = F::ZERO;
    assert_eq!(accumulate_all_relations(&row, &params, &F::ONE)[0], F::ZERO);
  }

  #[test]
  fn test_permutation_relation_first_row() {
    let mut rng = StdRng::seed_from_u64(17);
    let params = RelationParameters {
      beta: F::random(&mut rng),
      gamma: F::random(&mut rng),
      ..Default::default()
    };

    // identity permutation on the first row: z_perm = 0, z_perm_shift = 1
    let mut row = zero_row();
    row[Entity::LagrangeFirst] = F::ONE;
    for k in 0..NUM_WIRES {
      row[Entity::WIRES[k]] = F::random(&mut rng);
      row[Entity::IDS[k]] = F::from(k as u64 * 8);
      row[Entity::SIGMAS[k]] = F::from(k as u64 * 8);
    }
    row[Entity::ZPermShift] = F::ONE;

    let evals = accumulate_all_relations(&row, &params, &F::ONE);
    assert_eq!(evals[1], F::ZERO);
    assert_eq!(evals[2], F::ZERO);
  }

  #[test]
  fn test_batching_uses_separators() {
    let evals = [F::ONE, F::from(2), F::from(3), F::from(4), F::from(5)];
    let alpha = F::from(10);
    let alphas = crate::traits::transcript::powers(&alpha, NUM_SUBRELATIONS);
    assert_eq!(batch_subrelations(&evals, &alphas), F::from(54321));
  }

  #[test]
  fn test_public_input_delta_without_inputs_is_one() {
    let delta = compute_public_input_delta::<F>(&[], &F::from(3), &F::from(5), 8, 1).unwrap();
    assert_eq!(delta, F::ONE);
  }

  #[test]
  fn test_public_input_delta_single_input() {
    let (x, beta, gamma) = (F::from(9), F::from(3), F::from(5));
    let delta = compute_public_input_delta(&[x], &beta, &gamma, 8, 1).unwrap();
    // (9 + 5 + 3 * 9) / (9 + 5 - 3 * 2)
    assert_eq!(delta, F::from(41) * F::from(8).invert().unwrap());
  }

  #[test]
  fn test_compress() {
    let v = [F::from(1), F::from(2), F::from(3), F::from(4)];
    assert_eq!(compress(F::from(10), v), F::from(4321));
  }
}
