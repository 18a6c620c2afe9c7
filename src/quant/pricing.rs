//! # Pricing
//!
//! $$
//! V_0=\mathbb E^{\mathbb Q}\!\left[e^{-rT}\,(S_T-K)^+\right]
//! $$
//!
pub mod bsm;
pub mod pnl;
