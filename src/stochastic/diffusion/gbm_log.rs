//! # GBM Log
//!
//! $$
//! \ln(S_{t+dt}/S_t) = (\mu - \tfrac12\sigma^2)\,dt + \sigma\,dW,\quad dW\sim\mathcal{N}(0,dt)
//! $$
//!
//! Euler–Maruyama applied to the log-price: every step multiplies by a positive factor, so the
//! path stays strictly positive whatever the Gaussian draws are.
//!
use ndarray::Array1;
use rand::Rng;
use rand_distr::StandardNormal;
use tracing::trace;

use crate::error::HedgeError;
use crate::error::Result;
use crate::quant::market::MarketParameters;
use crate::stochastic::path::PricePath;
use crate::traits::ProcessExt;

/// Log-Euler GBM driven by the rate and the true volatility of validated
/// [`MarketParameters`].
pub struct GBMLog {
  params: MarketParameters,
}

impl GBMLog {
  pub fn new(mu: f64, sigma: f64, n: usize, s0: f64, t: f64) -> Result<Self> {
    let params = MarketParameters::new(s0, mu, sigma, sigma, t, n)?;
    Ok(Self::from_params(&params))
  }

  /// Risk-neutral path under the true volatility.
  pub fn from_params(params: &MarketParameters) -> Self {
    Self { params: *params }
  }

  /// Drift rate
  pub fn mu(&self) -> f64 {
    self.params.r()
  }

  /// Volatility
  pub fn sigma(&self) -> f64 {
    self.params.sigma_true()
  }

  /// Number of discrete time steps
  pub fn n(&self) -> usize {
    self.params.n()
  }

  /// Run the recurrence over a caller-supplied sequence of Brownian increments.
  ///
  /// `dw` must hold exactly `n` increments, each already scaled to variance `dt`.
  pub fn sample_with_increments(&self, dw: &[f64]) -> Result<PricePath> {
    let n = self.n();
    if dw.len() != n {
      return Err(HedgeError::PathMismatch {
        expected: n,
        actual: dw.len(),
      });
    }
    if let Some(&bad) = dw.iter().find(|x| !x.is_finite()) {
      return Err(HedgeError::invalid("dw", bad, "increments must be finite"));
    }

    Ok(self.evolve(|i| dw[i - 1]))
  }

  fn evolve(&self, mut increment: impl FnMut(usize) -> f64) -> PricePath {
    let n = self.n();
    let sigma = self.sigma();
    let drift_ln = (self.mu() - 0.5 * sigma * sigma) * self.params.dt();

    let mut s = Array1::<f64>::zeros(n + 1);
    s[0] = self.params.s0();

    for i in 1..=n {
      let log_inc = drift_ln + sigma * increment(i);
      // Floor at the smallest normal so an underflowing exp cannot produce a zero price.
      s[i] = (s[i - 1] * log_inc.exp()).max(f64::MIN_POSITIVE);
    }

    trace!(n, s_n = s[n], "sampled log-euler gbm path");
    PricePath::from_parts(self.params.time_grid(), s)
  }
}

impl ProcessExt for GBMLog {
  type Output = PricePath;

  fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Output {
    let sqrt_dt = self.params.dt().sqrt();
    self.evolve(|_| {
      let z: f64 = rng.sample(StandardNormal);
      sqrt_dt * z
    })
  }
}
