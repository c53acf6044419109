//! Logging
//!
//! Installs a `tracing` fmt subscriber. `MENAGERIE_LOG` takes precedence over
//! the caller's default filter.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV: &str = "MENAGERIE_LOG";

pub fn filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install the global subscriber; a second call is a no-op
pub fn init(default_directive: &str) {
    let _ = tracing_subscriber::registry()
        .with(filter(default_directive))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init("warn");
        init("debug");
    }
}
