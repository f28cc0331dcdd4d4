//! Driver for the lasr front end.
//!
//! The analyser in `lasr_sema` is pure: it takes parsed modules from a
//! [`ModuleSource`](lasr_sema::ModuleSource) and reports through
//! diagnostics. This crate supplies what a command-line front end needs on
//! top of it:
//!
//! - [`Session`] holds the options and cache shared by every compilation
//! - [`MemorySources`] serves modules parsed ahead of time
//! - [`FileModuleCache`] persists compiled modules between runs
//! - [`init_tracing`] turns on `RUST_LOG`-driven debug output

mod cache;
mod session;
mod sources;

use std::sync::Once;

pub use cache::FileModuleCache;
pub use session::{render_diagnostics, Session, SessionError};
pub use sources::MemorySources;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=lasr_sema=debug`
/// or `RUST_LOG=lasrc=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
