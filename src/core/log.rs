use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

const APP_TARGET: &str = "alchr";

// Events from dependencies such as reqwest and hyper are never shown.
fn app_filter(verbose: bool) -> Targets {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    Targets::new().with_target(APP_TARGET, level)
}

/// Installs the global subscriber. `RUST_LOG` can narrow the level chosen by `verbose`.
///
/// Logs go to stderr so tables on stdout can be piped. Without `verbose`
/// only warnings, such as items that failed to resolve, are shown.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .without_time(),
        )
        .with(app_filter(verbose))
        .with(env_filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_app_filter_levels() {
        let quiet = app_filter(false);
        assert!(quiet.would_enable("alchr::cli::rank", &Level::WARN));
        assert!(!quiet.would_enable("alchr::core::item", &Level::DEBUG));
        assert!(!quiet.would_enable("reqwest::connect", &Level::WARN));

        let verbose = app_filter(true);
        assert!(verbose.would_enable("alchr::core::item", &Level::DEBUG));
        assert!(!verbose.would_enable("alchr::core::item", &Level::TRACE));
        assert!(!verbose.would_enable("hyper_util::client", &Level::DEBUG));
    }
}
