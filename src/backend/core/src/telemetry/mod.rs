//! Telemetry: structured logging for the portal.
//!
//! Permission decisions are logged at `debug`/`trace`, authorization
//! failures on directory mutations at `warn`. Hosts that already install a
//! subscriber can skip [`init_logging`] entirely; the core only emits events.
//!
//! # Example
//!
//! ```rust,no_run
//! use orgportal_core::config::PortalConfig;
//! use orgportal_core::telemetry::init_logging;
//!
//! let config = PortalConfig::load().expect("config");
//! init_logging(&config.logging, &config.environment).expect("logging");
//! ```

pub mod logging;

pub use logging::{build_filter, init_logging, resolve_format, LogFormat, LoggingConfig};
