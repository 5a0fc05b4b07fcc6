//! HTTP surface of the credential service.
//!
//! - [`config`] - CLI, environment and file configuration.
//! - [`service`] - axum routes and handlers.
//! - [`telemetry`] - logging and optional OpenTelemetry export.

pub mod config;
pub mod service;
pub mod telemetry;
