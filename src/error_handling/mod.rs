//! Error handling.

mod types;

pub use types::{AuditError, URL_OR_HTML_REQUIRED};
