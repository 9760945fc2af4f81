#![forbid(unsafe_code)]
//! cadence-core library.
//!
//! Input model, validation and configuration shared by the allocation
//! engine (`cadence-plan`) and the `cadence` CLI.
//!
//! # Conventions
//!
//! - **Errors**: fatal input problems are [`error::ValidationError`];
//!   I/O and parsing helpers use `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod model;
pub mod validate;

pub use error::{ErrorCode, ValidationError};
