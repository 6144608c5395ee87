// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the UltraHonk prover project.
// See the LICENSE file in the project root for full license information.

//! Dense multilinear polynomials given by their evaluations over the Boolean hypercube.
//!
//! Row `i` of a column corresponds to the hypercube point whose `j`-th coordinate is bit `j`
//! of `i`. Relation-check challenges bind the least significant coordinate first, so after
//! binding `u_0, ..., u_{d-1}` a column collapses to its evaluation at `(u_0, ..., u_{d-1})`.
#[cfg(test)]
use crate::math::Math;
use ff::Field;
use rayon::prelude::*;

/// Binds the least significant variable of the hypercube table `evals`:
/// `new[j] = evals[2j] + r * (evals[2j+1] - evals[2j])`.
pub fn bind_bot<F: Field>(evals: &[F], r: &F) -> Vec<F> {
  evals
    .par_chunks(2)
    .map(|pair| match pair {
      [lo, hi] => *lo + *r * (*hi - *lo),
      [lo] => *lo,
      _ => F::ZERO,
    })
    .collect()
}

/// Returns `v` shifted down by one row: `out[i] = v[i + 1]`, `out[n - 1] = 0`.
pub fn shift_left<F: Field>(v: &[F]) -> Vec<F> {
  let mut out = Vec::with_capacity(v.len());
  out.extend_from_slice(v.get(1..).unwrap_or(&[]));
  if !v.is_empty() {
    out.push(F::ZERO);
  }
  out
}

/// A multilinear extension $\tilde{Z}(x_0, ..., x_{m-1})$ stored as the vector of its
/// $2^m$ hypercube evaluations, used as a reference evaluator in tests.
///
/// $$
/// \tilde{Z}(x) = \sum_{e \in \{0,1\}^m} Z(e) \prod_{j} (x_j e_j + (1 - x_j)(1 - e_j))
/// $$
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MultilinearPolynomial<F: Field> {
  Z: Vec<F>,
}

#[cfg(test)]
impl<F: Field> MultilinearPolynomial<F> {
  pub(crate) fn new(Z: Vec<F>) -> Self {
    debug_assert!(Z.len().is_power_of_two());
    MultilinearPolynomial { Z }
  }

  pub(crate) fn num_vars(&self) -> usize {
    self.Z.len().log_2()
  }

  pub(crate) fn len(&self) -> usize {
    self.Z.len()
  }

  pub(crate) fn bind_poly_var_bot(&mut self, r: &F) {
    self.Z = bind_bot(&self.Z, r);
  }

  /// Evaluates the polynomial at `point`, where `point[j]` is the value of coordinate `j`.
  pub(crate) fn evaluate(&self, point: &[F]) -> F {
    debug_assert_eq!(1 << point.len(), self.Z.len());
    let mut evals = self.Z.clone();
    for r in point {
      evals = bind_bot(&evals, r);
    }
    evals.first().copied().unwrap_or(F::ZERO)
  }

  pub(crate) fn shifted(&self) -> Vec<F> {
    shift_left(&self.Z)
  }
}

#[cfg(test)]
impl<F: Field> core::ops::Index<usize> for MultilinearPolynomial<F> {
  type Output = F;

  #[inline(always)]
  fn index(&self, index: usize) -> &F {
    &(self.Z[index])
  }
}
