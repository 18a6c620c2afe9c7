//! # Stochastic
//!
//! Path generation for the hedging simulation.
//!
//! | Module        | Description                                               |
//! |---------------|-----------------------------------------------------------|
//! | [`diffusion`] | Geometric Brownian motion discretised in log-space.       |
//! | [`path`]      | The immutable `(time, price)` trajectory a sample yields. |
//!
//! ## Example Usage
//!
//! ```rust
//! use delta_hedge::GBMLog;
//! use delta_hedge::ProcessExt;
//! use rand::SeedableRng;
//!
//! let gbm = GBMLog::new(0.0, 0.2, 252, 100.0, 1.0)?;
//! let path = gbm.sample(&mut rand::rngs::StdRng::seed_from_u64(42));
//! ```
//!
pub mod diffusion;
pub mod path;
