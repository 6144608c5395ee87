pub trait Math {
  /// Ceiling of the base-two logarithm.
  fn log_2(self) -> usize;

  /// Exact base-two logarithm; `None` unless `self` is a power of two.
  fn exact_log_2(self) -> Option<usize>;
}

impl Math for usize {
  fn log_2(self) -> usize {
    assert_ne!(self, 0);

    if self.is_power_of_two() {
      self.trailing_zeros() as usize
    } else {
      (usize::BITS - self.leading_zeros()) as usize
    }
  }

  fn exact_log_2(self) -> Option<usize> {
    self
      .is_power_of_two()
      .then_some(self.trailing_zeros() as usize)
  }
}
