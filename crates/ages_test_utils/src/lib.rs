//! # Ages Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Determinism test harness
//! - Fixture catalogs, configurations and engines
//! - Seeded random self-play
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod play;

/// Re-export proptest for convenience.
pub use proptest;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install a test-friendly tracing subscriber.
///
/// Honors `RUST_LOG` (defaulting to `warn`) and writes through the test
/// harness so output is captured per test. Safe to call from every test:
/// only the first call installs anything.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .with(filter)
        .try_init();
}
