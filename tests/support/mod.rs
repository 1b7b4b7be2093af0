#![allow(dead_code)]

pub mod fakes;
pub mod resources;

use tracing_subscriber::EnvFilter;

/// Installs a log subscriber which writes through the test harness.
///
/// The level is taken from `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
