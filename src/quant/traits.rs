/// Pricer trait.
pub trait PricerExt: TimeExt {
  /// Calculate the price.
  fn calculate_price(&self) -> f64;

  /// Sensitivity of the price to the underlying.
  fn delta(&self) -> f64;
}

pub trait TimeExt {
  fn tau(&self) -> Option<f64>;

  fn eval(&self) -> Option<chrono::NaiveDate> {
    None
  }

  fn expiration(&self) -> Option<chrono::NaiveDate> {
    None
  }

  /// Return tau directly, or compute it from eval/expiration dates (ACT/365).
  fn tau_or_from_dates(&self) -> Option<f64> {
    if let Some(tau) = self.tau() {
      return Some(tau);
    }
    match (self.eval(), self.expiration()) {
      (Some(e), Some(x)) => Some(x.signed_duration_since(e).num_days() as f64 / 365.0),
      _ => None,
    }
  }
}
