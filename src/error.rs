//! # Errors
//!
//! $$
//! \text{call} \mapsto \text{Ok}(\text{result}) \;\big|\; \text{Err}(\text{rejection before any state is built})
//! $$
//!
use thiserror::Error;

/// Errors surfaced at the call boundary of the simulator and the hedge accountant.
///
/// Every variant is raised before any computation starts, so a caller never observes a
/// partially built path or a half-settled book.
#[derive(Debug, Error)]
pub enum HedgeError {
  /// A scalar input is outside its admissible range.
  #[error("invalid parameter `{name}` = {value}: {reason}")]
  InvalidParameter {
    name: &'static str,
    value: f64,
    reason: &'static str,
  },

  /// A supplied price path or increment buffer does not match the time grid.
  #[error("path length mismatch: expected {expected} points, got {actual}")]
  PathMismatch { expected: usize, actual: usize },

  /// Writing a series to disk failed.
  #[error("failed to export `{series}`")]
  Export {
    series: &'static str,
    #[source]
    source: ndarray_npy::WriteNpyError,
  },

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl HedgeError {
  pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
    Self::InvalidParameter {
      name,
      value,
      reason,
    }
  }
}

pub type Result<T> = std::result::Result<T, HedgeError>;
