//! Multi-scalar multiplication over affine bases.
//!
//! The bucket method is adapted from halo2. Selector and permutation columns are dominated
//! by zero and one entries, so those are peeled off before bucketing.
use crate::{errors::HonkError, start_span};
use ff::{Field, PrimeField};
use group::Group;
use halo2curves::CurveAffine;
use rayon::{current_num_threads, prelude::*};
use std::time::Instant;
use tracing::{debug, info_span};

// inputs below this size are not worth splitting across threads
const PARALLEL_THRESHOLD: usize = 1 << 10;

#[derive(Clone, Copy)]
enum Bucket<C: CurveAffine> {
  None,
  Affine(C),
  Projective(C::Curve),
}

impl<C: CurveAffine> Bucket<C> {
  fn add_assign(&mut self, other: &C) {
    *self = match *self {
      Bucket::None => Bucket::Affine(*other),
      Bucket::Affine(a) => Bucket::Projective(a + *other),
      Bucket::Projective(a) => Bucket::Projective(a + other),
    }
  }

  fn add(self, other: C::Curve) -> C::Curve {
    match self {
      Bucket::None => other,
      Bucket::Affine(a) => other + a,
      Bucket::Projective(a) => other + a,
    }
  }
}

fn window_size(n: usize) -> usize {
  match n {
    0..4 => 1,
    4..32 => 3,
    _ => (n as f64).ln().ceil() as usize,
  }
}

// reads the `c`-bit digit at position `segment` of a little-endian scalar repr
fn digit<F: PrimeField>(segment: usize, c: usize, repr: &F::Repr) -> usize {
  let bytes = repr.as_ref();
  let skip_bits = segment * c;
  let skip_bytes = skip_bits / 8;
  if skip_bytes >= bytes.len() {
    return 0;
  }

  let mut v = [0u8; 8];
  for (dst, src) in v.iter_mut().zip(bytes[skip_bytes..].iter()) {
    *dst = *src;
  }
  let shifted = u64::from_le_bytes(v) >> (skip_bits - skip_bytes * 8);
  (shifted % (1 << c)) as usize
}

fn msm_serial<C: CurveAffine>(coeffs: &[C::Scalar], bases: &[C]) -> C::Curve {
  let mut unit_sum = C::Curve::identity();
  let mut general = Vec::new();
  for (s, b) in coeffs.iter().zip(bases) {
    if *s == C::Scalar::ONE {
      unit_sum += b;
    } else if !bool::from(s.is_zero()) {
      general.push((s.to_repr(), *b));
    }
  }
  if general.is_empty() {
    return unit_sum;
  }

  let c = window_size(general.len());
  let segments = C::Scalar::NUM_BITS as usize / c + 1;
  let general_sum = (0..segments)
    .rev()
    .fold(C::Curve::identity(), |mut acc, segment| {
      for _ in 0..c {
        acc = acc.double();
      }

      let mut buckets = vec![Bucket::None; (1 << c) - 1];
      for (repr, base) in general.iter() {
        let d = digit::<C::Scalar>(segment, c, repr);
        if d != 0 {
          buckets[d - 1].add_assign(base);
        }
      }

      // summation by parts: 3a + 2b + c = a + (a + b) + (a + b + c)
      let mut running_sum = C::Curve::identity();
      for bucket in buckets.into_iter().rev() {
        running_sum = bucket.add(running_sum);
        acc += &running_sum;
      }
      acc
    });

  unit_sum + general_sum
}

/// Computes `sum_i coeffs[i] * bases[i]`.
///
/// Large inputs are split into one chunk per rayon worker.
///
/// # Errors
/// Returns `HonkError::InvalidInputLength` if `coeffs` and `bases` differ in length.
pub fn msm<C: CurveAffine>(coeffs: &[C::Scalar], bases: &[C]) -> Result<C::Curve, HonkError> {
  if coeffs.len() != bases.len() {
    return Err(HonkError::InvalidInputLength);
  }
  let (_msm_span, msm_t) = start_span!("msm", size = coeffs.len());

  let num_threads = current_num_threads();
  let result = if coeffs.len() >= PARALLEL_THRESHOLD && num_threads > 1 {
    let chunk = coeffs.len().div_ceil(num_threads);
    coeffs
      .par_chunks(chunk)
      .zip(bases.par_chunks(chunk))
      .map(|(coeffs, bases)| msm_serial(coeffs, bases))
      .reduce(C::Curve::identity, |sum, evl| sum + evl)
  } else {
    msm_serial(coeffs, bases)
  };

  debug!(elapsed_ms = %msm_t.elapsed().as_millis(), size = coeffs.len(), "msm");
  Ok(result)
}
