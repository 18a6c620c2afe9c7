//! # Delta-hedged short call P&L
//!
//! $$
//! B_{t_{j}} = B_{t_{j-1}}e^{r(t_j-t_{j-1})} - (\Delta_{t_j}-\Delta_{t_{j-1}})S_{t_j},\qquad
//! \text{P\&L} = B_T + \Delta_T S_T - (S_T-K)^+
//! $$
//!
//! A short call is hedged by holding $\Delta$ shares financed from a cash account that starts
//! with the premium. The book is revisited every `hedge_interval` grid steps and at maturity,
//! always in the order accrue, reprice, rebalance, record. Settlement liquidates the shares and
//! pays the payoff exactly once at index $N$.
//!
use std::path::Path;

use ndarray::Array1;
use ndarray_npy::write_npy;
use rand::Rng;
use tracing::debug;
use tracing::debug_span;
use tracing::trace;

use crate::error::HedgeError;
use crate::error::Result;
use crate::quant::market::MarketParameters;
use crate::quant::pricing::bsm::call_delta;
use crate::quant::pricing::bsm::BSMPricer;
use crate::quant::traits::PricerExt;
use crate::stochastic::diffusion::gbm_log::GBMLog;
use crate::stochastic::path::PricePath;
use crate::traits::ProcessExt;

/// Relative tolerance used when matching a supplied path against the parameter grid.
const GRID_TOL: f64 = 1e-9;

/// Cash and share inventory carried through the rebalancing loop.
#[derive(Clone, Copy, Debug)]
struct HedgeState {
  cash: f64,
  shares: f64,
}

impl HedgeState {
  fn accrue(&mut self, r: f64, elapsed: f64) {
    self.cash *= (r * elapsed).exp();
  }

  /// Trade to `delta` shares at `spot`, returning the signed trade size.
  fn rebalance(&mut self, delta: f64, spot: f64) -> f64 {
    let trade = delta - self.shares;
    self.cash -= trade * spot;
    self.shares = delta;
    trade
  }

  fn value(&self, spot: f64) -> f64 {
    self.cash + self.shares * spot
  }

  fn liquidate(&mut self, spot: f64) {
    self.cash += self.shares * spot;
    self.shares = 0.0;
  }
}

/// Outcome of one hedging run.
///
/// `portfolio_values`, `option_values`, `deltas`, `hedge_times` and `checkpoints` all have one
/// entry per recorded point: the initial hedge, every rebalance, and the terminal settlement.
#[derive(Clone, Debug, PartialEq)]
pub struct HedgeResult {
  /// Cash left after liquidating the shares and paying the payoff
  pub final_pnl: f64,
  /// Cash plus stock value after each rebalance; the last entry is the settled cash
  pub portfolio_values: Array1<f64>,
  /// Model value of the call at each point; the last entry is the payoff
  pub option_values: Array1<f64>,
  /// Delta held after each rebalance; the last entry is the expiry delta
  pub deltas: Array1<f64>,
  /// Time of each recorded point
  pub hedge_times: Array1<f64>,
  /// Grid index of each recorded point
  pub checkpoints: Vec<usize>,
  /// The simulated path and its time grid
  pub path: PricePath,
}

impl HedgeResult {
  /// Number of recorded points.
  pub fn len(&self) -> usize {
    self.portfolio_values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.portfolio_values.is_empty()
  }

  /// Premium received for the short call.
  pub fn premium(&self) -> f64 {
    self.option_values[0]
  }

  /// Spot price at each recorded point.
  pub fn checkpoint_prices(&self) -> Array1<f64> {
    let prices = self.path.prices();
    self.checkpoints.iter().map(|&i| prices[i]).collect()
  }

  /// Cash account at each recorded point, recovered as portfolio value minus stock value.
  ///
  /// The stock position is flat after settlement, so the last entry equals the final P&L.
  pub fn cash_balances(&self) -> Array1<f64> {
    let prices = self.checkpoint_prices();
    let last = self.len() - 1;
    (0..self.len())
      .map(|j| {
        if j == last {
          self.portfolio_values[j]
        } else {
          self.portfolio_values[j] - self.deltas[j] * prices[j]
        }
      })
      .collect()
  }

  /// Write every series as `<name>.npy` under `dir`, creating it if needed.
  pub fn write_npy(&self, dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let checkpoint_prices = self.checkpoint_prices();
    let series: [(&'static str, &Array1<f64>); 7] = [
      ("portfolio_values", &self.portfolio_values),
      ("option_values", &self.option_values),
      ("deltas", &self.deltas),
      ("hedge_times", &self.hedge_times),
      ("checkpoint_prices", &checkpoint_prices),
      ("time", self.path.times()),
      ("stock_path", self.path.prices()),
    ];

    for (name, data) in series {
      write_npy(dir.join(format!("{name}.npy")), data)
        .map_err(|source| HedgeError::Export {
          series: name,
          source,
        })?;
    }

    Ok(())
  }
}

/// Discretely rebalanced delta hedge of a short European call.
///
/// The path is driven by `sigma_true`; prices and deltas use `sigma_model`. Only
/// [`DeltaHedge::new`] builds one, so the strike and interval are always in range.
#[derive(Clone, Copy, Debug)]
pub struct DeltaHedge {
  params: MarketParameters,
  strike: f64,
  hedge_interval: usize,
}

impl DeltaHedge {
  pub fn new(params: MarketParameters, strike: f64, hedge_interval: usize) -> Result<Self> {
    if !(strike.is_finite() && strike > 0.0) {
      return Err(HedgeError::invalid("strike", strike, "must be finite and positive"));
    }

    if hedge_interval == 0 || hedge_interval > params.n() {
      return Err(HedgeError::invalid(
        "hedge_interval",
        hedge_interval as f64,
        "must lie in [1, n]",
      ));
    }

    Ok(Self {
      params,
      strike,
      hedge_interval,
    })
  }

  pub fn params(&self) -> &MarketParameters {
    &self.params
  }

  pub fn strike(&self) -> f64 {
    self.strike
  }

  pub fn hedge_interval(&self) -> usize {
    self.hedge_interval
  }

  /// Grid indices at which the book is rebalanced: every multiple of `hedge_interval` up to
  /// `n`, then `n` itself if it is not already one of them.
  pub fn checkpoints(&self) -> Vec<usize> {
    let n = self.params.n();
    let mut idx: Vec<usize> = (self.hedge_interval..=n).step_by(self.hedge_interval).collect();
    if idx.last() != Some(&n) {
      idx.push(n);
    }
    idx
  }

  /// Simulate a path with the given RNG and hedge along it.
  pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> HedgeResult {
    let path = GBMLog::from_params(&self.params).sample(rng);
    self.replay(path)
  }

  /// Hedge along an existing path laid out on this hedge's time grid.
  pub fn run_on_path(&self, path: &PricePath) -> Result<HedgeResult> {
    let expected = self.params.n() + 1;
    if path.len() != expected {
      return Err(HedgeError::PathMismatch {
        expected,
        actual: path.len(),
      });
    }

    let grid = self.params.time_grid();
    for (&a, &b) in grid.iter().zip(path.times().iter()) {
      if (a - b).abs() > GRID_TOL * self.params.t() {
        return Err(HedgeError::invalid(
          "times",
          b,
          "path times do not match the parameter grid",
        ));
      }
    }

    let s0 = self.params.s0();
    if (path.initial() - s0).abs() > GRID_TOL * s0 {
      return Err(HedgeError::invalid("s0", path.initial(), "path does not start at s0"));
    }

    // Settle on the exact grid so that tau hits zero at maturity.
    Ok(self.replay(PricePath::from_parts(grid, path.prices().clone())))
  }

  /// `m` independent runs in parallel, run `i` seeded with `seed + i`.
  pub fn run_par(&self, m: usize, seed: u64) -> Vec<HedgeResult> {
    self.sample_par(m, seed)
  }

  fn replay(&self, path: PricePath) -> HedgeResult {
    let s0 = self.params.s0();
    let r = self.params.r();
    let sigma_model = self.params.sigma_model();
    let t = self.params.t();
    let n = self.params.n();
    let dt = self.params.dt();
    let k = self.strike;

    let _span = debug_span!("delta_hedge", strike = k, interval = self.hedge_interval).entered();

    let checkpoints = self.checkpoints();
    let len = checkpoints.len() + 2;
    let mut portfolio_values = Vec::with_capacity(len);
    let mut option_values = Vec::with_capacity(len);
    let mut deltas = Vec::with_capacity(len);
    let mut hedge_times = Vec::with_capacity(len);
    let mut recorded = Vec::with_capacity(len);

    let times = path.times();
    let prices = path.prices();

    let pricer = BSMPricer::new(s0, sigma_model, k, r, t);
    let premium = pricer.calculate_price();
    let delta0 = pricer.delta();

    let mut state = HedgeState {
      cash: premium,
      shares: 0.0,
    };
    state.rebalance(delta0, s0);

    portfolio_values.push(state.value(s0));
    option_values.push(premium);
    deltas.push(delta0);
    hedge_times.push(0.0);
    recorded.push(0);

    let mut last = 0;
    for i in checkpoints {
      let spot = prices[i];

      state.accrue(r, (i - last) as f64 * dt);
      last = i;

      let marked = pricer.reprice(spot, t - times[i]);
      let option = marked.calculate_price();
      let delta = marked.delta();

      let trade = state.rebalance(delta, spot);
      trace!(
        index = i,
        spot,
        delta,
        trade,
        cash = state.cash,
        "rebalanced"
      );

      portfolio_values.push(state.value(spot));
      option_values.push(option);
      deltas.push(delta);
      hedge_times.push(times[i]);
      recorded.push(i);
    }

    let s_n = prices[n];
    let payoff = (s_n - k).max(0.0);
    state.liquidate(s_n);
    state.cash -= payoff;

    portfolio_values.push(state.cash);
    option_values.push(payoff);
    deltas.push(call_delta(s_n, k, 0.0, r, sigma_model));
    hedge_times.push(t);
    recorded.push(n);

    debug!(premium, payoff, final_pnl = state.cash, "hedge settled");

    HedgeResult {
      final_pnl: state.cash,
      portfolio_values: Array1::from(portfolio_values),
      option_values: Array1::from(option_values),
      deltas: Array1::from(deltas),
      hedge_times: Array1::from(hedge_times),
      checkpoints: recorded,
      path,
    }
  }
}

impl ProcessExt for DeltaHedge {
  type Output = HedgeResult;

  fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Output {
    self.run(rng)
  }
}

/// Validate the inputs, simulate one path and hedge along it.
pub fn hedge<R: Rng + ?Sized>(
  params: MarketParameters,
  strike: f64,
  hedge_interval: usize,
  rng: &mut R,
) -> Result<HedgeResult> {
  Ok(DeltaHedge::new(params, strike, hedge_interval)?.run(rng))
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use approx::assert_relative_eq;
  use rand::rngs::StdRng;
  use rand::SeedableRng;
  use tracing_test::traced_test;

  use super::*;
  use crate::quant::pricing::bsm::call_price;

  fn reference() -> DeltaHedge {
    DeltaHedge::new(MarketParameters::default(), 100.0, 21).unwrap()
  }

  fn variance(xs: &[f64]) -> f64 {
    Array1::from(xs.to_vec()).var(1.0)
  }

  #[test]
  fn recorded_series_have_matching_lengths() {
    let h = reference();
    let res = h.run(&mut StdRng::seed_from_u64(1));
    // 252 / 21 = 12 rebalances, plus the initial hedge and the settlement.
    assert_eq!(res.len(), 14);
    assert_eq!(res.option_values.len(), 14);
    assert_eq!(res.deltas.len(), 14);
    assert_eq!(res.hedge_times.len(), 14);
    assert_eq!(res.checkpoints.len(), 14);
    assert_eq!(res.path.len(), 253);
    assert_eq!(res.hedge_times[0], 0.0);
    assert_eq!(res.hedge_times[13], 1.0);
  }

  #[test]
  fn initial_point_is_premium_funded_hedge() {
    let h = reference();
    let res = h.run(&mut StdRng::seed_from_u64(2));
    let premium = call_price(100.0, 100.0, 1.0, 0.0, 0.2);
    let delta = call_delta(100.0, 100.0, 1.0, 0.0, 0.2);
    assert_eq!(res.premium(), premium);
    assert_eq!(res.deltas[0], delta);
    // cash + delta * S0 = premium - delta * S0 + delta * S0
    assert_relative_eq!(res.portfolio_values[0], premium, max_relative = 1e-12);
  }

  #[test]
  fn final_pnl_is_settled_cash() {
    let h = reference();
    let res = h.run(&mut StdRng::seed_from_u64(3));
    let last = res.len() - 1;
    let s_n = res.path.terminal();
    assert_eq!(res.final_pnl, res.portfolio_values[last]);
    assert_eq!(res.option_values[last], (s_n - 100.0).max(0.0));
    assert_eq!(res.deltas[last], if s_n > 100.0 { 1.0 } else { 0.0 });
    assert_eq!(*res.cash_balances().last().unwrap(), res.final_pnl);
  }

  #[test]
  fn book_is_self_financing() {
    let params = MarketParameters::builder()
      .r(0.05)
      .sigma_true(0.25)
      .sigma_model(0.2)
      .n(100)
      .build()
      .unwrap();
    let h = DeltaHedge::new(params, 95.0, 7).unwrap();
    let res = h.run(&mut StdRng::seed_from_u64(4));

    let dt = params.dt();
    let cash = res.cash_balances();
    let prices = res.checkpoint_prices();
    // Every point except the settlement is a rebalance.
    for j in 1..res.len() - 1 {
      let steps = (res.checkpoints[j] - res.checkpoints[j - 1]) as f64;
      let expected = cash[j - 1] * (0.05 * dt * steps).exp()
        - (res.deltas[j] - res.deltas[j - 1]) * prices[j];
      assert_abs_diff_eq!(cash[j], expected, epsilon = 1e-9);
    }

    // Settlement: liquidate the final delta, pay the payoff.
    let last = res.len() - 1;
    let settled = cash[last - 1] + res.deltas[last - 1] * prices[last] - res.option_values[last];
    assert_abs_diff_eq!(res.final_pnl, settled, epsilon = 1e-9);
  }

  #[test]
  fn hedge_interval_equal_to_n_records_three_points() {
    let h = DeltaHedge::new(MarketParameters::default(), 100.0, 252).unwrap();
    assert_eq!(h.checkpoints(), vec![252]);
    let res = h.run(&mut StdRng::seed_from_u64(5));
    assert_eq!(res.len(), 3);
    assert_eq!(res.checkpoints, vec![0, 252, 252]);
    assert_eq!(res.hedge_times.to_vec(), vec![0.0, 1.0, 1.0]);
  }

  #[test]
  fn uneven_interval_forces_one_final_checkpoint() {
    let params = MarketParameters::builder().n(10).build().unwrap();
    let h = DeltaHedge::new(params, 100.0, 3).unwrap();
    assert_eq!(h.checkpoints(), vec![3, 6, 9, 10]);

    let res = h.run(&mut StdRng::seed_from_u64(6));
    assert_eq!(res.len(), 6);
    assert_eq!(res.checkpoints, vec![0, 3, 6, 9, 10, 10]);
    // Exactly one settlement: only the last two entries sit at maturity.
    assert_eq!(res.hedge_times.iter().filter(|&&t| t == 1.0).count(), 2);
  }

  #[test]
  fn interval_of_one_rebalances_every_step() {
    let params = MarketParameters::builder().n(20).build().unwrap();
    let h = DeltaHedge::new(params, 100.0, 1).unwrap();
    assert_eq!(h.checkpoints(), (1..=20).collect::<Vec<_>>());
    assert_eq!(h.run(&mut StdRng::seed_from_u64(0)).len(), 22);
  }

  #[test]
  fn invalid_inputs_fail_before_simulation() {
    let p = MarketParameters::default();
    assert!(DeltaHedge::new(p, 100.0, 0).is_err());
    assert!(DeltaHedge::new(p, 100.0, 253).is_err());
    assert!(DeltaHedge::new(p, 0.0, 21).is_err());
    assert!(DeltaHedge::new(p, f64::INFINITY, 21).is_err());

    assert!(MarketParameters::builder().sigma_model(0.0).build().is_err());
    assert!(MarketParameters::builder().n(0).build().is_err());
    assert!(hedge(p, 100.0, 0, &mut StdRng::seed_from_u64(0)).is_err());

    let h = DeltaHedge::new(p, 100.0, 21).unwrap();
    assert_eq!(h.hedge_interval(), 21);
    assert_eq!(h.strike(), 100.0);
    assert_eq!(h.params(), &p);
  }

  #[test]
  fn same_seed_reproduces_pnl_bit_for_bit() {
    let p = MarketParameters::default();
    let a = hedge(p, 100.0, 21, &mut StdRng::seed_from_u64(2024)).unwrap();
    let b = hedge(p, 100.0, 21, &mut StdRng::seed_from_u64(2024)).unwrap();
    assert_eq!(a.final_pnl.to_bits(), b.final_pnl.to_bits());
    assert_eq!(a, b);
  }

  #[test]
  fn run_par_matches_sequential_runs() {
    let h = reference();
    let par = h.run_par(8, 100);
    for (i, res) in par.iter().enumerate() {
      let seq = h.run(&mut StdRng::seed_from_u64(100 + i as u64));
      assert_eq!(res.final_pnl.to_bits(), seq.final_pnl.to_bits());
    }
  }

  #[test]
  fn matched_hedge_error_is_small_and_centred() {
    let params = MarketParameters::builder().n(252).build().unwrap();
    let h = DeltaHedge::new(params, 100.0, 1).unwrap();
    let pnls: Vec<f64> = h.run_par(1000, 9).iter().map(|r| r.final_pnl).collect();
    let mean = pnls.iter().sum::<f64>() / pnls.len() as f64;
    let premium = call_price(100.0, 100.0, 1.0, 0.0, 0.2);
    assert!(mean.abs() < 0.1, "mean = {mean}");
    assert!(variance(&pnls).sqrt() < 0.15 * premium);
  }

  #[test]
  fn volatility_mismatch_widens_pnl_distribution() {
    let matched = MarketParameters::default();
    let mismatched = MarketParameters::builder().sigma_true(0.3).build().unwrap();

    let runs = 1000;
    let pnl = |p: MarketParameters| -> Vec<f64> {
      DeltaHedge::new(p, 100.0, 21)
        .unwrap()
        .run_par(runs, 77)
        .iter()
        .map(|r| r.final_pnl)
        .collect()
    };

    let a = pnl(matched);
    let b = pnl(mismatched);
    let var_a = variance(&a);
    let var_b = variance(&b);
    assert!(var_b > 1.5 * var_a, "matched {var_a}, mismatched {var_b}");

    // Under-priced volatility loses money on average.
    let mean_b = b.iter().sum::<f64>() / runs as f64;
    assert!(mean_b < -1.0, "mean = {mean_b}");
  }

  #[test]
  fn run_on_path_replays_a_known_path() {
    let params = MarketParameters::builder().n(4).r(0.02).build().unwrap();
    let gbm = GBMLog::from_params(&params);
    let path = gbm.sample_with_increments(&[0.1, 0.1, 0.1, 0.1]).unwrap();

    let h = DeltaHedge::new(params, 100.0, 2).unwrap();
    let res = h.run_on_path(&path).unwrap();
    assert_eq!(res.checkpoints, vec![0, 2, 4, 4]);
    assert_eq!(res.path, path);

    // Steadily rising path ends in the money with a full share held.
    assert!(path.terminal() > 100.0);
    assert_eq!(res.deltas[2], 1.0);
    assert_relative_eq!(res.option_values[3], path.terminal() - 100.0, max_relative = 1e-12);
  }

  #[test]
  fn run_on_path_rejects_foreign_grid() {
    let params = MarketParameters::builder().n(4).build().unwrap();
    let h = DeltaHedge::new(params, 100.0, 2).unwrap();

    let short = PricePath::new(ndarray::array![0.0, 1.0], ndarray::array![100.0, 101.0]).unwrap();
    assert!(matches!(
      h.run_on_path(&short),
      Err(HedgeError::PathMismatch {
        expected: 5,
        actual: 2
      })
    ));

    let stretched = PricePath::new(
      ndarray::array![0.0, 0.5, 1.0, 1.5, 2.0],
      Array1::from_elem(5, 100.0),
    )
    .unwrap();
    assert!(h.run_on_path(&stretched).is_err());

    let shifted = PricePath::new(
      ndarray::array![0.0, 0.25, 0.5, 0.75, 1.0],
      ndarray::array![90.0, 100.0, 100.0, 100.0, 100.0],
    )
    .unwrap();
    assert!(h.run_on_path(&shifted).is_err());
  }

  #[test]
  fn export_writes_every_series() {
    let res = reference().run(&mut StdRng::seed_from_u64(8));
    let dir = tempfile::tempdir().unwrap();
    res.write_npy(dir.path()).unwrap();

    let deltas: Array1<f64> = ndarray_npy::read_npy(dir.path().join("deltas.npy")).unwrap();
    assert_eq!(deltas, res.deltas);
    let stock: Array1<f64> = ndarray_npy::read_npy(dir.path().join("stock_path.npy")).unwrap();
    assert_eq!(&stock, res.path.prices());
    for name in ["portfolio_values", "option_values", "hedge_times", "checkpoint_prices", "time"] {
      assert!(dir.path().join(format!("{name}.npy")).exists());
    }
  }

  #[test]
  #[traced_test]
  fn settlement_is_logged() {
    reference().run(&mut StdRng::seed_from_u64(10));
    assert!(logs_contain("hedge settled"));
    assert!(logs_contain("final_pnl"));
  }
}
