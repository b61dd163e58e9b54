//! Crate configuration.
//!
//! Re-exports the constant tables used across the audit pipeline and defines
//! the logger format switch consumed by `initialization::init_logger`.

mod constants;

pub use constants::*;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable colored output.
    #[default]
    Plain,
    /// One JSON object per line, for log shippers.
    Json,
}
