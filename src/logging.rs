//! Logging setup for graph wiring and resolution
//!
//! Every event the crate emits uses the [`TARGET`] target: graph builds,
//! registrations, validation failures and construction at `debug`, cache
//! hits and ancestor lookups at `trace`. Installing a subscriber needs the
//! `logging-json` or `logging-pretty` feature; without either, [`init`] does
//! nothing and events go to whatever subscriber the application set up.
//!
//! ```rust,ignore
//! scoped_graph::logging::init();
//!
//! scoped_graph::logging::builder()
//!     .with_level(tracing::Level::TRACE)
//!     .graph_only()
//!     .format(scoped_graph::logging::LogFormat::Compact)
//!     .init();
//! ```

use tracing::Level;

/// Target used by every event this crate emits
pub const TARGET: &str = "scoped_graph";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for LogFormat {
    /// JSON when built with `logging-json`, pretty otherwise
    fn default() -> Self {
        if cfg!(feature = "logging-json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Subscriber settings; [`init`](Self::init) installs them globally.
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    graph_only: bool,
    source_location: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::default(),
            graph_only: false,
            source_location: false,
        }
    }
}

impl LoggingBuilder {
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Drop events from other crates
    pub fn graph_only(mut self) -> Self {
        self.graph_only = true;
        self
    }

    /// Include file and line in each event
    pub fn with_source_location(mut self) -> Self {
        self.source_location = true;
        self
    }

    /// `EnvFilter` directive, e.g. `debug` or `scoped_graph=trace`
    pub fn directive(&self) -> String {
        let level = self.level.as_str().to_ascii_lowercase();
        if self.graph_only {
            format!("{TARGET}={level}")
        } else {
            level
        }
    }

    /// Install the subscriber. A second call is ignored.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        let layer = fmt::layer()
            .with_file(self.source_location)
            .with_line_number(self.source_location);
        let registry = tracing_subscriber::registry().with(EnvFilter::new(self.directive()));

        let installed = match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => registry.with(layer.json()).try_init(),
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => registry.with(layer.pretty()).try_init(),
            LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
            LogFormat::Compact => registry.with(layer.compact()).try_init(),
        };

        if installed.is_err() {
            tracing::debug!(target: TARGET, "Global subscriber already installed");
        }
    }

    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) {}
}

pub fn builder() -> LoggingBuilder {
    LoggingBuilder::default()
}

/// Install the default subscriber at `debug`
pub fn init() {
    builder().init();
}
