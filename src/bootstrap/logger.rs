//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup, after the effective level is resolved.

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Noisy dependency targets pinned to `warn` unless `RUST_LOG` says otherwise.
const QUIET_TARGETS: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn", "rustls=warn"];

/// Initialise the global tracing subscriber.
///
/// `level` accepts standard level strings (`"error"` … `"trace"`) or a full
/// `EnvFilter` directive. When `force` is `true` (a CLI `-v` flag was given)
/// `level` beats `RUST_LOG`; otherwise `RUST_LOG` wins and `level` is the
/// fallback.
pub fn init(level: &str, force: bool) -> Result<(), AppError> {
    let filter = if force {
        build_filter(level)?
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => build_filter(level)?,
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))?;

    Ok(())
}

fn build_filter(level: &str) -> Result<EnvFilter, AppError> {
    let mut directives = vec![level.to_string()];
    directives.extend(QUIET_TARGETS.iter().map(|t| t.to_string()));
    EnvFilter::try_new(directives.join(","))
        .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))
}

/// Map a count of `-v` flags onto a level, one tier per flag:
/// `-v` warn, `-vv` info, `-vvv` debug, `-vvvv`+ trace.
pub fn level_for_verbosity(verbosity: u8) -> Option<&'static str> {
    match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_directive_errors() {
        assert!(matches!(build_filter("naggy=loud"), Err(AppError::Logger(_))));
    }

    #[test]
    fn verbosity_tiers() {
        assert_eq!(level_for_verbosity(0), None);
        assert_eq!(level_for_verbosity(1), Some("warn"));
        assert_eq!(level_for_verbosity(3), Some("debug"));
        assert_eq!(level_for_verbosity(9), Some("trace"));
    }

    #[test]
    fn filter_accepts_directives() {
        assert!(build_filter("info").is_ok());
        assert!(build_filter("naggy=debug").is_ok());
    }

    #[test]
    fn init_info_succeeds_or_already_init() {
        // May already be set by a prior test in the same process.
        match init("info", false) {
            Ok(()) => {}
            Err(AppError::Logger(msg)) if msg.contains("set subscriber") => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}
