//! Initialization of shared resources: logger and HTTP clients.

mod client;
mod logger;

pub use client::{init_page_client, init_script_client};
pub use logger::init_logger;
