//! Dense univariate polynomials in coefficient form.
//!
//! Coefficients are stored lowest degree first: `a x^2 + b x + c` is `vec![c, b, a]`.
use crate::errors::HonkError;
use ff::{Field, PrimeField};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A univariate dense polynomial in coefficient form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniPoly<Scalar: PrimeField> {
  pub(crate) coeffs: Vec<Scalar>,
}

impl<Scalar: PrimeField> UniPoly<Scalar> {
  /// Wraps a coefficient vector, lowest degree first.
  pub fn new(coeffs: Vec<Scalar>) -> Self {
    Self { coeffs }
  }

  /// Interpolates the unique polynomial of degree `< evals.len()` taking value
  /// `evals[i]` at `x = i`.
  ///
  /// # Errors
  /// Returns `HonkError::InvalidInputLength` for empty input and
  /// `HonkError::DivisionByZero` if the Vandermonde system is singular.
  pub fn from_evals(evals: &[Scalar]) -> Result<Self, HonkError> {
    let n = evals.len();
    if n == 0 {
      return Err(HonkError::InvalidInputLength);
    }

    let mut matrix = (0..n)
      .map(|i| {
        let x = Scalar::from(i as u64);
        let mut row = Vec::with_capacity(n + 1);
        let mut power = Scalar::ONE;
        for _ in 0..n {
          row.push(power);
          power *= x;
        }
        row.push(evals[i]);
        row
      })
      .collect::<Vec<_>>();

    let coeffs = gaussian_elimination(&mut matrix)?;
    Ok(Self { coeffs })
  }

  /// Returns the coefficients, lowest degree first.
  pub fn coeffs(&self) -> &[Scalar] {
    &self.coeffs
  }

  /// Consumes the polynomial and returns its coefficients.
  pub fn into_coeffs(self) -> Vec<Scalar> {
    self.coeffs
  }

  /// Returns the formal degree (number of stored coefficients minus one).
  pub fn degree(&self) -> usize {
    self.coeffs.len().saturating_sub(1)
  }

  /// Evaluates the polynomial at zero.
  pub fn eval_at_zero(&self) -> Scalar {
    self.coeffs.first().copied().unwrap_or(Scalar::ZERO)
  }

  /// Evaluates the polynomial at one.
  pub fn eval_at_one(&self) -> Scalar {
    self.coeffs.par_iter().copied().sum()
  }

  /// Evaluates the polynomial at `r` with Horner's rule.
  pub fn evaluate(&self, r: &Scalar) -> Scalar {
    self
      .coeffs
      .iter()
      .rev()
      .fold(Scalar::ZERO, |acc, c| acc * r + c)
  }

  /// Divides by `X - z` and returns `(quotient, remainder)`.
  ///
  /// The remainder equals the evaluation at `z`.
  pub fn divide_by_linear(&self, z: &Scalar) -> (Self, Scalar) {
    if self.coeffs.is_empty() {
      return (Self::new(Vec::new()), Scalar::ZERO);
    }
    let mut quotient = vec![Scalar::ZERO; self.coeffs.len() - 1];
    let mut carry = Scalar::ZERO;
    for i in (0..self.coeffs.len()).rev() {
      carry = self.coeffs[i] + carry * z;
      if i > 0 {
        quotient[i - 1] = carry;
      }
    }
    (Self::new(quotient), carry)
  }

  /// Adds `scalar * other` into `self`, extending `self` when `other` is longer.
  pub fn add_scaled(&mut self, scalar: &Scalar, other: &[Scalar]) {
    if other.len() > self.coeffs.len() {
      self.coeffs.resize(other.len(), Scalar::ZERO);
    }
    self
      .coeffs
      .par_iter_mut()
      .zip(other.par_iter())
      .for_each(|(a, b)| *a += *scalar * b);
  }
}

/// Solves the augmented system `matrix` (n rows, n + 1 columns) by Gauss-Jordan elimination.
///
/// # Errors
/// Returns `HonkError::InvalidInputLength` on a malformed matrix and
/// `HonkError::DivisionByZero` if the system is singular.
pub fn gaussian_elimination<F: PrimeField>(matrix: &mut [Vec<F>]) -> Result<Vec<F>, HonkError> {
  let size = matrix.len();
  if size == 0 || matrix.iter().any(|row| row.len() != size + 1) {
    return Err(HonkError::InvalidInputLength);
  }

  for col in 0..size {
    let pivot = (col..size)
      .find(|&r| !bool::from(matrix[r][col].is_zero()))
      .ok_or(HonkError::DivisionByZero)?;
    matrix.swap(col, pivot);

    let inv = div_f(F::ONE, matrix[col][col])?;
    for k in col..=size {
      matrix[col][k] *= inv;
    }

    let pivot_row = matrix[col].clone();
    for (r, row) in matrix.iter_mut().enumerate() {
      if r == col || bool::from(row[col].is_zero()) {
        continue;
      }
      let factor = row[col];
      for k in col..=size {
        row[k] -= factor * pivot_row[k];
      }
    }
  }

  Ok(matrix.iter().map(|row| row[size]).collect())
}

/// Returns `a / b`.
///
/// # Errors
/// Returns `HonkError::DivisionByZero` if `b` is zero.
pub fn div_f<F: PrimeField>(a: F, b: F) -> Result<F, HonkError> {
  b.invert()
    .into_option()
    .map(|inv| a * inv)
    .ok_or(HonkError::DivisionByZero)
}

/// Inverts every element of `v` in place with a single field inversion.
///
/// # Errors
/// Returns `HonkError::DivisionByZero` if any element is zero.
pub fn batch_invert<F: Field>(v: &mut [F]) -> Result<(), HonkError> {
  let mut prefix = Vec::with_capacity(v.len());
  let mut acc = F::ONE;
  for x in v.iter() {
    prefix.push(acc);
    acc *= x;
  }

  let mut inv = acc.invert().into_option().ok_or(HonkError::DivisionByZero)?;
  for (x, p) in v.iter_mut().zip(prefix).rev() {
    let next = inv * *x;
    *x = inv * p;
    inv = next;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::provider::bn256::bn256;
  use rand::{SeedableRng, rngs::StdRng};

  type F = bn256::Scalar;

  #[test]
  fn test_from_evals_quad() {
    // polynomial is 2x^2 + 3x + 1
    let evals = vec![F::ONE, F::from(6), F::from(15)];
    let poly = UniPoly::from_evals(&evals).unwrap();

    assert_eq!(poly.coeffs, vec![F::ONE, F::from(3), F::from(2)]);
    assert_eq!(poly.eval_at_zero(), evals[0]);
    assert_eq!(poly.eval_at_one(), evals[1]);
    assert_eq!(poly.evaluate(&F::from(3)), F::from(28));
  }

  #[test]
  fn test_from_evals_degree_six() {
    // x^6 - 2x^4 + 7x + 3, sampled at 0..=6 like a relation-check round
    let p = UniPoly::new(vec![
      F::from(3),
      F::from(7),
      F::ZERO,
      F::ZERO,
      -F::from(2),
      F::ZERO,
      F::ONE,
    ]);
    let evals = (0..7u64).map(|x| p.evaluate(&F::from(x))).collect::<Vec<_>>();
    let q = UniPoly::from_evals(&evals).unwrap();
    assert_eq!(p, q);
    assert_eq!(q.degree(), 6);
    assert_eq!(q.evaluate(&F::from(11)), p.evaluate(&F::from(11)));
  }

  #[test]
  fn test_divide_by_linear() {
    let mut rng = StdRng::seed_from_u64(9);
    let p = UniPoly::new((0..9).map(|_| F::random(&mut rng)).collect());
    let z = F::random(&mut rng);
    let (q, rem) = p.divide_by_linear(&z);
    assert_eq!(rem, p.evaluate(&z));

    let x = F::random(&mut rng);
    assert_eq!(q.evaluate(&x) * (x - z) + rem, p.evaluate(&x));
  }

  #[test]
  fn test_add_scaled_extends() {
    let mut p = UniPoly::new(vec![F::ONE]);
    p.add_scaled(&F::from(2), &[F::ONE, F::from(3)]);
    assert_eq!(p.coeffs, vec![F::from(3), F::from(6)]);
  }

  #[test]
  fn test_batch_invert() {
    let mut v = vec![F::from(2), F::from(5), F::from(11)];
    let expected = v.iter().map(|x| x.invert().unwrap()).collect::<Vec<_>>();
    batch_invert(&mut v).unwrap();
    assert_eq!(v, expected);

    let mut with_zero = vec![F::ONE, F::ZERO];
    assert_eq!(batch_invert(&mut with_zero), Err(HonkError::DivisionByZero));
  }

  #[test]
  fn test_div_f() {
    assert_eq!(div_f(F::from(6), F::from(3)).unwrap(), F::from(2));
    assert_eq!(div_f(F::ONE, F::ZERO), Err(HonkError::DivisionByZero));
  }
}
