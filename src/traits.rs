//! # Traits
//!
//! $$
//! \text{Trait contracts: }\mathcal{A}:(\text{params}, \omega)\to\text{samples}
//! $$
//!
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rayon::prelude::*;

/// A process that can be sampled from a caller-owned random source.
///
/// Implementors hold no generator of their own, so the same process value can be shared
/// across threads while every sample consumes only the RNG it is handed.
pub trait ProcessExt: Send + Sync {
  type Output: Send;

  fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Output;

  /// Draw `m` independent samples in parallel.
  ///
  /// Sample `i` uses its own `StdRng` seeded with `seed + i`, so the batch is reproducible
  /// regardless of how rayon schedules the work.
  fn sample_par(&self, m: usize, seed: u64) -> Vec<Self::Output> {
    (0..m)
      .into_par_iter()
      .map(|i| {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
        self.sample(&mut rng)
      })
      .collect()
  }
}
