//! Leveled progress logging.
//!
//! Two layers cooperate:
//!
//! - **[`LogConfig`]**: passed to each [`crate::engine::Engine`]. The engine
//!   gates its own events on it, so engines built with different levels do
//!   not interfere with one another (tests rely on this).
//! - **[`init`]**: installs the process-wide `tracing` subscriber once, from
//!   `main`. Output goes to stderr in compact format.

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Minimum level an engine emits at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    pub minimum_level: LevelFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            minimum_level: LevelFilter::INFO,
        }
    }
}

impl LogConfig {
    pub fn new(minimum_level: LevelFilter) -> Self {
        Self { minimum_level }
    }

    /// Whether events at `level` pass this configuration.
    pub fn enables(&self, level: Level) -> bool {
        self.minimum_level >= level
    }

    /// Apply `RUST_LOG` when it is set and parses; otherwise keep `self`.
    pub fn with_env_override(self) -> Self {
        match std::env::var(EnvFilter::DEFAULT_ENV) {
            Ok(directives) => self.with_directives(&directives),
            Err(_) => self,
        }
    }

    /// Raise or lower the minimum level to the most verbose level enabled by
    /// `directives` (`RUST_LOG` syntax). Unparseable directives are ignored.
    pub fn with_directives(self, directives: &str) -> Self {
        match EnvFilter::try_new(directives) {
            Ok(filter) => match filter.max_level_hint() {
                Some(minimum_level) => Self { minimum_level },
                None => self,
            },
            Err(_) => self,
        }
    }
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence when set; otherwise `config.minimum_level`
/// applies. Engines should be built from [`LogConfig::with_env_override`] so
/// their own gate agrees with the subscriber.
///
/// # Example
/// ```bash
/// RUST_LOG=pruner=debug pruner --dry-run
/// ```
pub fn init(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.minimum_level.to_string()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
