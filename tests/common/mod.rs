#![allow(dead_code)]
//! Shared fixtures for integration tests.
//!
//! The fixture programs model the little class library the engine is
//! exercised against: a static calculator, an instance counter, and a
//! driver with a private helper. Test files build more specialized
//! programs inline.

pub mod fixtures;

pub use fixtures::{counter_pair, ping_driver, scenario, CounterPair, PingDriver, Scenario};

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize tracing once per test binary; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
