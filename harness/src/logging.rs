//! Process-wide tracing setup.
//!
//! # Separation of Concerns
//!
//! - **Diagnostics (this module)**: Harness internals via `RUST_LOG`, output
//!   to stderr. Never part of the envelope.
//!
//! - **Log capture (`io/bridge`)**: Records emitted while a script runs are
//!   routed into the envelope's `logs`. The running thread gets the bridge as
//!   its scoped subscriber; every other thread reaches the capture through
//!   the relay layer installed here, independent of `RUST_LOG`.

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::io::bridge::RelayLayer;

/// Initialize the global subscriber.
///
/// Reads `RUST_LOG` env var for the stderr diagnostics. Defaults to `warn`
/// if unset. The filter applies to stderr only, so the relay sees every
/// record and applies the capture threshold itself.
///
/// # Example
/// ```bash
/// RUST_LOG=harness=debug INPUT_JSON='{"a":1}' cargo run -- run sum
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_filter(filter),
        )
        .with(RelayLayer)
        .init();
}
