//! Logging initialization.
//!
//! A single initialization point for the `tracing` subscriber used by the
//! command-line tool. Library code only emits events.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Verbosity selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    /// Picks a verbosity from `-v` / `-q` flags; quiet wins.
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        match (verbose, quiet) {
            (_, true) => Verbosity::Quiet,
            (true, false) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        }
    }

    /// Default filter directive when `RUST_LOG` is unset.
    pub fn directive(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "openapi_sync=warn",
            Verbosity::Normal => "openapi_sync=info",
            Verbosity::Verbose => "openapi_sync=debug",
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Initializes the fmt subscriber on stderr.
///
/// `RUST_LOG` overrides the verbosity. Later calls are no-ops.
pub fn init(verbosity: Verbosity) {
    INIT_ONCE.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));
        // Another subscriber may already be installed (tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_idempotent() {
        init(Verbosity::Quiet);
        init(Verbosity::Verbose);
    }

    #[test]
    fn test_from_flags() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, false).directive(), "openapi_sync=info");
    }
}
