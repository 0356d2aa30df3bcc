//! Log output setup.
//!
//! Logs go to stderr; stdout carries only finished segment paths so it can be
//! piped into other tools.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` has already been folded into `log_level` by the config loader;
/// an unparsable directive falls back to `info`.
pub fn init(log_level: &str) {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
