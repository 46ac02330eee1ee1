use std::env;

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging knobs gathered from the command line.
#[derive(Debug, Default, Clone)]
pub struct LogOptions {
    pub log_level: Option<String>,
    pub verbose: bool,
    pub quiet: bool,
}

impl LogOptions {
    fn is_explicit(&self) -> bool {
        self.log_level.is_some() || self.verbose || self.quiet
    }
}

/// Install the stderr subscriber.
///
/// `interactive` skips installation unless a level was asked for, since
/// anything written to stderr would tear the alternate screen.
pub fn init_logging(opts: &LogOptions, default_level: &str, interactive: bool) {
    let rust_log = env::var("RUST_LOG").is_ok();
    if interactive && !rust_log && !opts.is_explicit() {
        return;
    }

    let level = resolve_level(opts, default_level);
    let filter = if rust_log {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(format!(
            "ollamate={level},ollamate_core={level},ureq=warn",
            level = level.as_str().to_lowercase()
        ))
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init();
}

pub fn resolve_level(opts: &LogOptions, default_level: &str) -> Level {
    if let Some(level) = &opts.log_level {
        parse_level(level)
    } else if opts.verbose {
        Level::DEBUG
    } else if opts.quiet {
        Level::ERROR
    } else {
        parse_level(default_level)
    }
}

fn parse_level(level_str: &str) -> Level {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to WARN. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::WARN
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_level_wins() {
        let opts = LogOptions {
            log_level: Some("info".to_string()),
            verbose: true,
            quiet: false,
        };
        assert_eq!(resolve_level(&opts, "error"), Level::INFO);
    }

    #[test]
    fn test_verbose_and_quiet() {
        let verbose = LogOptions {
            verbose: true,
            ..Default::default()
        };
        assert_eq!(resolve_level(&verbose, "warn"), Level::DEBUG);
        let quiet = LogOptions {
            quiet: true,
            ..Default::default()
        };
        assert_eq!(resolve_level(&quiet, "warn"), Level::ERROR);
    }

    #[test]
    fn test_default_level_and_fallback() {
        let opts = LogOptions::default();
        assert!(!opts.is_explicit());
        assert_eq!(resolve_level(&opts, "Debug"), Level::DEBUG);
        assert_eq!(resolve_level(&opts, "loud"), Level::WARN);
    }
}
