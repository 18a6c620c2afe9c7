//! # Market parameters
//!
//! $$
//! \theta=(S_0,r,\sigma_{\text{true}},\sigma_{\text{model}},T,N),\qquad \Delta t=T/N
//! $$
//!
//! $\sigma_{\text{true}}$ drives the simulated path, $\sigma_{\text{model}}$ drives pricing and
//! hedging. Setting them apart is the volatility-mismatch scenario.
//!
use ndarray::Array1;

use crate::error::HedgeError;
use crate::error::Result;
use crate::quant::traits::TimeExt;

/// Default spot price
pub const S0: f64 = 100.0;
/// Default strike price
pub const K: f64 = 100.0;
/// Default number of time steps (one trading year of daily steps)
pub const N: usize = 252;
/// Default volatility used for both the path and the hedge
pub const SIGMA: f64 = 0.2;

/// Immutable scalar inputs shared by the simulator and the hedge accountant.
///
/// Fields are only reachable through [`MarketParameters::new`] and the builder, so every value
/// in circulation has passed validation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarketParameters {
  /// Initial asset price
  s0: f64,
  /// Continuously compounded risk-free rate
  r: f64,
  /// Volatility of the simulated path
  sigma_true: f64,
  /// Volatility assumed by the pricer when hedging
  sigma_model: f64,
  /// Maturity in years
  t: f64,
  /// Number of time steps
  n: usize,
}

impl Default for MarketParameters {
  fn default() -> Self {
    Self {
      s0: S0,
      r: 0.0,
      sigma_true: SIGMA,
      sigma_model: SIGMA,
      t: 1.0,
      n: N,
    }
  }
}

impl MarketParameters {
  pub fn new(s0: f64, r: f64, sigma_true: f64, sigma_model: f64, t: f64, n: usize) -> Result<Self> {
    let params = Self {
      s0,
      r,
      sigma_true,
      sigma_model,
      t,
      n,
    };
    params.validate()?;
    Ok(params)
  }

  pub fn builder() -> MarketParametersBuilder {
    MarketParametersBuilder::default()
  }

  pub fn s0(&self) -> f64 {
    self.s0
  }

  pub fn r(&self) -> f64 {
    self.r
  }

  pub fn sigma_true(&self) -> f64 {
    self.sigma_true
  }

  pub fn sigma_model(&self) -> f64 {
    self.sigma_model
  }

  pub fn t(&self) -> f64 {
    self.t
  }

  pub fn n(&self) -> usize {
    self.n
  }

  /// Step size of the time grid.
  #[inline]
  pub fn dt(&self) -> f64 {
    self.t / self.n as f64
  }

  /// Whether the hedge uses a different volatility than the path.
  pub fn is_mismatched(&self) -> bool {
    self.sigma_true != self.sigma_model
  }

  /// Uniform grid of `n + 1` points with `times[0] == 0` and `times[n] == t` exactly.
  pub fn time_grid(&self) -> Array1<f64> {
    let n = self.n as f64;
    Array1::from_iter((0..=self.n).map(|i| self.t * (i as f64 / n)))
  }

  fn validate(&self) -> Result<()> {
    positive("s0", self.s0)?;
    positive("sigma_true", self.sigma_true)?;
    positive("sigma_model", self.sigma_model)?;
    positive("t", self.t)?;

    if !self.r.is_finite() {
      return Err(HedgeError::invalid("r", self.r, "must be finite"));
    }

    if self.n == 0 {
      return Err(HedgeError::invalid("n", 0.0, "at least one time step is required"));
    }

    Ok(())
  }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
  if value.is_finite() && value > 0.0 {
    Ok(())
  } else {
    Err(HedgeError::invalid(name, value, "must be finite and positive"))
  }
}

/// Chained construction of [`MarketParameters`].
///
/// The maturity can be given in years or derived from an evaluation and an expiration date.
#[derive(Clone, Debug)]
pub struct MarketParametersBuilder {
  s0: f64,
  r: f64,
  sigma_true: f64,
  sigma_model: f64,
  t: Option<f64>,
  eval: Option<chrono::NaiveDate>,
  expiration: Option<chrono::NaiveDate>,
  n: usize,
}

impl Default for MarketParametersBuilder {
  fn default() -> Self {
    let defaults = MarketParameters::default();
    Self {
      s0: defaults.s0,
      r: defaults.r,
      sigma_true: defaults.sigma_true,
      sigma_model: defaults.sigma_model,
      t: None,
      eval: None,
      expiration: None,
      n: defaults.n,
    }
  }
}

impl MarketParametersBuilder {
  pub fn s0(mut self, s0: f64) -> Self {
    self.s0 = s0;
    self
  }
  pub fn r(mut self, r: f64) -> Self {
    self.r = r;
    self
  }
  /// Sets the path and the model volatility to the same value.
  pub fn sigma(mut self, sigma: f64) -> Self {
    self.sigma_true = sigma;
    self.sigma_model = sigma;
    self
  }
  pub fn sigma_true(mut self, sigma_true: f64) -> Self {
    self.sigma_true = sigma_true;
    self
  }
  pub fn sigma_model(mut self, sigma_model: f64) -> Self {
    self.sigma_model = sigma_model;
    self
  }
  pub fn t(mut self, t: f64) -> Self {
    self.t = Some(t);
    self
  }
  pub fn eval(mut self, eval: chrono::NaiveDate) -> Self {
    self.eval = Some(eval);
    self
  }
  pub fn expiration(mut self, expiration: chrono::NaiveDate) -> Self {
    self.expiration = Some(expiration);
    self
  }
  pub fn n(mut self, n: usize) -> Self {
    self.n = n;
    self
  }
  pub fn build(self) -> Result<MarketParameters> {
    let t = match (self.eval, self.expiration) {
      (Some(_), Some(_)) | (None, None) => self.tau_or_from_dates().unwrap_or(1.0),
      (Some(_), None) | (None, Some(_)) => {
        return Err(HedgeError::invalid(
          "t",
          f64::NAN,
          "eval and expiration must be given together",
        ))
      }
    };

    MarketParameters::new(self.s0, self.r, self.sigma_true, self.sigma_model, t, self.n)
  }
}

impl TimeExt for MarketParametersBuilder {
  fn tau(&self) -> Option<f64> {
    self.t
  }

  fn eval(&self) -> Option<chrono::NaiveDate> {
    self.eval
  }

  fn expiration(&self) -> Option<chrono::NaiveDate> {
    self.expiration
  }
}
