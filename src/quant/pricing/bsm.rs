//! # Black–Scholes call
//!
//! $$
//! C=S\,\Phi(d_1)-Ke^{-r\tau}\Phi(d_2),\qquad
//! d_{1,2}=\frac{\ln(S/K)+(r\pm\tfrac12\sigma^2)\tau}{\sigma\sqrt\tau},\qquad
//! \Delta_C=\Phi(d_1)
//! $$
//!
//! At or past expiry ($\tau\le0$) the option is worth its intrinsic value and the delta
//! collapses to the indicator $\mathbf 1_{S>K}$.
//!
use impl_new_derive::ImplNew;
use statrs::distribution::ContinuousCDF;
use statrs::distribution::Normal;

use crate::quant::traits::PricerExt;
use crate::quant::traits::TimeExt;

#[inline]
fn d1_d2(s: f64, k: f64, tau: f64, r: f64, v: f64) -> (f64, f64) {
  let v_sqrt_tau = v * tau.sqrt();
  let d1 = ((s / k).ln() + (r + 0.5 * v * v) * tau) / v_sqrt_tau;
  (d1, d1 - v_sqrt_tau)
}

#[inline]
fn check_inputs(s: f64, k: f64, v: f64) {
  debug_assert!(s > 0.0, "spot must be > 0");
  debug_assert!(k > 0.0, "strike must be > 0");
  debug_assert!(v > 0.0, "volatility must be > 0");
}

/// European call value.
pub fn call_price(s: f64, k: f64, tau: f64, r: f64, v: f64) -> f64 {
  check_inputs(s, k, v);

  if tau <= 0.0 {
    return (s - k).max(0.0);
  }

  let (d1, d2) = d1_d2(s, k, tau, r, v);
  let n = Normal::standard();
  let price = s * n.cdf(d1) - k * (-r * tau).exp() * n.cdf(d2);

  // Cancellation deep out of the money can leave a tiny negative residue.
  price.max(0.0)
}

/// European call delta.
pub fn call_delta(s: f64, k: f64, tau: f64, r: f64, v: f64) -> f64 {
  check_inputs(s, k, v);

  if tau <= 0.0 {
    return if s > k { 1.0 } else { 0.0 };
  }

  let (d1, _) = d1_d2(s, k, tau, r, v);
  Normal::standard().cdf(d1)
}

/// A priced European call.
#[derive(ImplNew, Clone, Copy, Debug)]
pub struct BSMPricer {
  /// Underlying price
  pub s: f64,
  /// Volatility
  pub v: f64,
  /// Strike price
  pub k: f64,
  /// Risk-free rate
  pub r: f64,
  /// Time to maturity in years
  pub tau: f64,
}

impl BSMPricer {
  /// Same contract, priced at another spot and remaining time.
  pub fn reprice(&self, s: f64, tau: f64) -> Self {
    Self { s, tau, ..*self }
  }
}

impl TimeExt for BSMPricer {
  fn tau(&self) -> Option<f64> {
    Some(self.tau)
  }
}

impl PricerExt for BSMPricer {
  fn calculate_price(&self) -> f64 {
    call_price(self.s, self.k, self.tau, self.r, self.v)
  }

  fn delta(&self) -> f64 {
    call_delta(self.s, self.k, self.tau, self.r, self.v)
  }
}
