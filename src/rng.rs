//! Seedable RNG wrapper behind the `RAND` operator and the `SEED` sequence.

use rand::rngs::SmallRng;
use rand::{Rng as _, SeedableRng};

#[derive(Debug, Clone)]
pub(crate) struct Rng {
  inner: SmallRng,
}

impl Rng {
  pub(crate) fn new() -> Self {
    Self {
      inner: SmallRng::seed_from_u64(0),
    }
  }

  pub(crate) fn reseed(&mut self, seed: f64) {
    self.inner = SmallRng::seed_from_u64(seed.to_bits());
  }

  /// Draws a uniform `f64` in `[min, max]`, swapping the bounds if given in
  /// reverse, matching `do_rand_get`.
  pub(crate) fn get(&mut self, min: f64, max: f64) -> f64 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    if lo == hi {
      return lo;
    }
    self.inner.gen_range(lo..=hi)
  }
}

impl Default for Rng {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use pretty_assertions::assert_eq;

  #[test]
  fn reseeding_is_deterministic() {
    let mut a = Rng::new();
    a.reseed(42.0);
    let mut b = Rng::new();
    b.reseed(42.0);
    for _ in 0..8 {
      assert_eq!(a.get(0.0, 1000.0), b.get(0.0, 1000.0));
    }
  }

  #[test]
  fn stays_within_bounds() {
    let mut r = Rng::new();
    r.reseed(7.0);
    for _ in 0..100 {
      let v = r.get(10.0, 20.0);
      assert!((10.0..=20.0).contains(&v));
    }
  }
}
