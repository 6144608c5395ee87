//! `PowPolynomial`: the multilinear extension of `x -> zeta^x` over the hypercube.
//!
//! Weighting every row by a distinct power of `zeta` turns "the relation vanishes on
//! every row" into a single sum that is zero with overwhelming probability.
use ff::Field;
use rayon::prelude::*;

/// Represents the polynomial `pow(x) = prod_j (1 - x_j + x_j * zeta^{2^j})`, which agrees
/// with `zeta^x` on every hypercube point `x`.
#[derive(Clone, Debug)]
pub struct PowPolynomial<F: Field> {
  zeta: F,
  num_vars: usize,
}

impl<F: Field> PowPolynomial<F> {
  /// Creates the polynomial for challenge `zeta` over `num_vars` variables.
  pub fn new(zeta: &F, num_vars: usize) -> Self {
    Self {
      zeta: *zeta,
      num_vars,
    }
  }

  /// Returns `[zeta^0, zeta^1, ..., zeta^{2^num_vars - 1}]`.
  pub fn evals(&self) -> Vec<F> {
    let n = 1usize << self.num_vars;
    // split into blocks so each worker starts from its own offset power
    let block = 1024.min(n);
    let step = self.zeta.pow_vartime([block as u64]);
    let starts = (0..n / block)
      .scan(F::ONE, |acc, _| {
        let cur = *acc;
        *acc *= step;
        Some(cur)
      })
      .collect::<Vec<_>>();

    starts
      .par_iter()
      .flat_map_iter(|start| {
        let zeta = self.zeta;
        (0..block).scan(*start, move |acc, _| {
          let cur = *acc;
          *acc *= zeta;
          Some(cur)
        })
      })
      .collect()
  }

  /// Evaluates the polynomial at `point`, where `point[j]` is coordinate `j`.
  pub fn evaluate(&self, point: &[F]) -> F {
    debug_assert_eq!(point.len(), self.num_vars);
    let mut zeta_pow = self.zeta;
    let mut acc = F::ONE;
    for u in point {
      acc *= F::ONE - u + *u * zeta_pow;
      zeta_pow = zeta_pow.square();
    }
    acc
  }
}
