//! Logging setup for the CLI.
//!
//! Logs go to stderr so price tables on stdout stay clean. `RUST_LOG`
//! replaces the built-in filter entirely when set.
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, filter::Targets, fmt, prelude::*};

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Built-in filter: this crate at WARN (DEBUG when verbose), dependencies
/// such as the HTTP client and the storage engine only at ERROR.
fn default_targets(verbose: bool) -> Targets {
    let crate_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    Targets::new()
        .with_target(CRATE_TARGET, crate_level)
        .with_default(LevelFilter::ERROR)
}

pub fn init_logging(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env().ok();
    let default_filter = env_filter.is_none().then(|| default_targets(verbose));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .without_time(),
        )
        .with(env_filter)
        .with(default_filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_default_targets() {
        let quiet = default_targets(false);
        assert!(quiet.would_enable("gameprice::core::cache", &Level::WARN));
        assert!(!quiet.would_enable("gameprice::core::cache", &Level::DEBUG));
        assert!(!quiet.would_enable("fjall", &Level::WARN));
        assert!(quiet.would_enable("reqwest", &Level::ERROR));

        let verbose = default_targets(true);
        assert!(verbose.would_enable("gameprice::providers", &Level::DEBUG));
        assert!(!verbose.would_enable("hyper", &Level::DEBUG));
    }
}
