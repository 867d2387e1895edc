// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Configuration
//!
//! Settings resolved from CLI flags and environment before `warp`'s own
//! engine config (`warp::infrastructure::EngineConfig::from_env`, which
//! governs the home directory and session layout) is constructed. This
//! structure is immutable once built and only concerns itself with how
//! the process starts up: log level, verbosity, and how long to wait
//! for a child build to exit during shutdown.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl LogLevel {
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    log_level: LogLevel,
    home_override: Option<PathBuf>,
    verbose: bool,
    shutdown_grace_period: Duration,
}

impl BootstrapConfig {
    pub fn builder() -> BootstrapConfigBuilder {
        BootstrapConfigBuilder::default()
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn home_override(&self) -> Option<&PathBuf> {
        self.home_override.as_ref()
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn shutdown_grace_period(&self) -> Duration {
        self.shutdown_grace_period
    }
}

#[derive(Debug, Default)]
pub struct BootstrapConfigBuilder {
    log_level: Option<LogLevel>,
    home_override: Option<PathBuf>,
    verbose: bool,
    shutdown_grace_period: Option<Duration>,
}

impl BootstrapConfigBuilder {
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn home_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.home_override = Some(path.into());
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    pub fn shutdown_grace_period(mut self, period: Duration) -> Self {
        self.shutdown_grace_period = Some(period);
        self
    }

    pub fn build(self) -> BootstrapConfig {
        BootstrapConfig {
            log_level: self.log_level.unwrap_or_default(),
            home_override: self.home_override,
            verbose: self.verbose,
            shutdown_grace_period: self
                .shutdown_grace_period
                .unwrap_or(Duration::from_secs(crate::shutdown::DEFAULT_GRACE_PERIOD_SECS)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_info_and_no_home_override() {
        let config = BootstrapConfig::builder().build();

        assert_eq!(config.log_level(), LogLevel::Info);
        assert!(config.home_override().is_none());
        assert!(!config.is_verbose());
    }

    #[test]
    fn builder_applies_every_setting() {
        let config = BootstrapConfig::builder()
            .log_level(LogLevel::Debug)
            .home_override("/tmp/warp-home")
            .verbose(true)
            .shutdown_grace_period(Duration::from_secs(10))
            .build();

        assert_eq!(config.log_level(), LogLevel::Debug);
        assert_eq!(config.home_override(), Some(&PathBuf::from("/tmp/warp-home")));
        assert!(config.is_verbose());
        assert_eq!(config.shutdown_grace_period(), Duration::from_secs(10));
    }

    #[test]
    fn log_level_maps_to_tracing_level() {
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
    }

    #[test]
    fn config_is_cloneable() {
        let config1 = BootstrapConfig::builder().log_level(LogLevel::Warn).build();
        let config2 = config1.clone();
        assert_eq!(config1.log_level(), config2.log_level());
    }
}
