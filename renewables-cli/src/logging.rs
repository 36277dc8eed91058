//! `tracing` subscriber setup.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Directives used when `RUST_LOG` is unset: the configured level for our
/// crates, with the HTTP stack held at `warn`.
pub fn default_directives(level: &str) -> String {
    format!("{level},reqwest=warn,hyper=warn,hyper_util=warn")
}

/// Install the global subscriber. `RUST_LOG` wins over `level`.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}
