use std::env;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use delta_hedge::DeltaHedge;
use delta_hedge::MarketParameters;
use ndarray::Array1;
use prettytable::row;
use prettytable::Table;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Knobs read from the environment, all optional.
struct DemoConfig {
  seed: u64,
  runs: usize,
  hedge_interval: usize,
  mismatched_sigma: f64,
  out_dir: Option<PathBuf>,
}

impl DemoConfig {
  fn from_env() -> Result<Self> {
    Ok(Self {
      seed: parse_var("HEDGE_SEED", 42)?,
      runs: parse_var("HEDGE_RUNS", 1000)?,
      hedge_interval: parse_var("HEDGE_INTERVAL", 21)?,
      mismatched_sigma: parse_var("HEDGE_SIGMA_TRUE", 0.3)?,
      out_dir: env::var_os("HEDGE_OUT").map(PathBuf::from),
    })
  }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
  T: std::str::FromStr,
  T::Err: std::error::Error + Send + Sync + 'static,
{
  match env::var(name) {
    Ok(raw) => raw
      .trim()
      .parse()
      .with_context(|| format!("could not parse {name}={raw}")),
    Err(_) => Ok(default),
  }
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    )
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();

  let cfg = DemoConfig::from_env()?;
  let matched = MarketParameters::default();
  let mismatched = MarketParameters::builder()
    .sigma_true(cfg.mismatched_sigma)
    .build()
    .context("invalid HEDGE_SIGMA_TRUE")?;

  tracing::info!(
    seed = cfg.seed,
    runs = cfg.runs,
    interval = cfg.hedge_interval,
    "running delta-hedge scenarios"
  );

  let mut table = Table::new();
  table.add_row(row![
    "scenario",
    "sigma_true",
    "sigma_model",
    "premium",
    "pnl (seed)",
    "mean pnl",
    "std pnl"
  ]);

  for (label, params) in [("matched", matched), ("mismatched", mismatched)] {
    let h = DeltaHedge::new(params, 100.0, cfg.hedge_interval)
      .with_context(|| format!("invalid {label} scenario"))?;

    let single = h.run(&mut StdRng::seed_from_u64(cfg.seed));
    let pnls: Array1<f64> = h
      .run_par(cfg.runs, cfg.seed)
      .iter()
      .map(|r| r.final_pnl)
      .collect();
    let mean = pnls.mean().unwrap_or(f64::NAN);
    let std = if pnls.len() > 1 { pnls.std(1.0) } else { 0.0 };

    tracing::info!(scenario = label, mean, std, "aggregated final P&L");

    if let Some(dir) = &cfg.out_dir {
      let dir = dir.join(label);
      single
        .write_npy(&dir)
        .with_context(|| format!("exporting {label} run to {}", dir.display()))?;
    }

    table.add_row(row![
      label,
      format!("{:.2}", params.sigma_true()),
      format!("{:.2}", params.sigma_model()),
      format!("{:.4}", single.premium()),
      format!("{:.4}", single.final_pnl),
      format!("{:.4}", mean),
      format!("{:.4}", std)
    ]);
  }

  table.printstd();
  Ok(())
}
