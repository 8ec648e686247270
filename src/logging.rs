// SPDX-License-Identifier: GPL-3.0-only

//! Log output
//!
//! Set `RUST_LOG` to control the level, e.g. `RUST_LOG=debug` or
//! `RUST_LOG=photobooth::session=debug`. Defaults to `warn`.

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(true)
        .with_level(true)
        .try_init();
}
