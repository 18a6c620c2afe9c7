//! # Price path
//!
//! $$
//! \{(t_i,S_i)\}_{i=0}^{N},\qquad t_i=i\,\Delta t,\qquad S_i>0
//! $$
//!
use ndarray::Array1;

use crate::error::HedgeError;
use crate::error::Result;

/// One sampled trajectory on a uniform time grid.
///
/// Built once by the simulator (or validated from caller data) and read-only afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct PricePath {
  times: Array1<f64>,
  prices: Array1<f64>,
}

impl PricePath {
  /// Wrap externally produced series. Lengths must agree, hold at least two points, start at
  /// `t = 0`, and every price must be strictly positive.
  pub fn new(times: Array1<f64>, prices: Array1<f64>) -> Result<Self> {
    if times.len() != prices.len() {
      return Err(HedgeError::PathMismatch {
        expected: times.len(),
        actual: prices.len(),
      });
    }
    if times.len() < 2 {
      return Err(HedgeError::PathMismatch {
        expected: 2,
        actual: times.len(),
      });
    }
    if times[0] != 0.0 {
      return Err(HedgeError::invalid("times[0]", times[0], "path must start at t = 0"));
    }
    if let Some(&bad) = prices.iter().find(|p| !(p.is_finite() && **p > 0.0)) {
      return Err(HedgeError::invalid("price", bad, "path prices must be finite and positive"));
    }

    Ok(Self { times, prices })
  }

  /// Simulator-side constructor; the recurrence already guarantees the invariants.
  pub(crate) fn from_parts(times: Array1<f64>, prices: Array1<f64>) -> Self {
    debug_assert_eq!(times.len(), prices.len());
    Self { times, prices }
  }

  pub fn times(&self) -> &Array1<f64> {
    &self.times
  }

  pub fn prices(&self) -> &Array1<f64> {
    &self.prices
  }

  /// Number of grid points (`N + 1`).
  pub fn len(&self) -> usize {
    self.prices.len()
  }

  pub fn is_empty(&self) -> bool {
    self.prices.is_empty()
  }

  /// Number of time steps (`N`).
  pub fn steps(&self) -> usize {
    self.len() - 1
  }

  pub fn initial(&self) -> f64 {
    self.prices[0]
  }

  pub fn terminal(&self) -> f64 {
    self.prices[self.steps()]
  }
}
