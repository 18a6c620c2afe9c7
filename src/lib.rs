//! # delta-hedge
//!
//! $$
//! \text{P\&L}=\underbrace{C_{\sigma_{\text{model}}}(S_0,T)}_{\text{premium}}
//! +\sum_j \Delta_{t_j}\,(S_{t_{j+1}}-S_{t_j})+\text{interest}-(S_T-K)^+
//! $$
//!
//! Profit and loss of a short European call hedged by discrete delta rebalancing along a
//! log-Euler geometric Brownian motion path.
//!
//! | Module        | Description                                                          |
//! |---------------|----------------------------------------------------------------------|
//! | [`stochastic`] | Log-Euler GBM path simulator and the [`PricePath`] it produces.      |
//! | [`quant`]      | Market parameters, the Black–Scholes call pricer and the hedge book. |
//! | [`traits`]     | Sampling contract shared by the simulator and the hedge.             |
//! | [`error`]      | Boundary validation errors.                                          |
//!
//! Every sampling call takes a caller-owned `rand::Rng`; nothing in the crate holds a
//! generator, so independent runs can be spread across threads with one seeded RNG each.
//!
pub mod error;
pub mod quant;
pub mod stochastic;
pub mod traits;

pub use error::HedgeError;
pub use quant::market::MarketParameters;
pub use quant::pricing::bsm::call_delta;
pub use quant::pricing::bsm::call_price;
pub use quant::pricing::pnl::hedge;
pub use quant::pricing::pnl::DeltaHedge;
pub use quant::pricing::pnl::HedgeResult;
pub use stochastic::diffusion::gbm_log::GBMLog;
pub use stochastic::path::PricePath;
pub use traits::ProcessExt;
