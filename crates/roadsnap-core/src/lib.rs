//! roadsnap-core library.
//!
//! Epic snapshot model, status classification, bucket summaries, planning
//! evaluation and time-window reports over recorded Jira snapshots.
//!
//! # Conventions
//!
//! - **Errors**: snapshot access returns [`error::SnapshotError`]; config
//!   loading uses `anyhow::Result` with context.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

#![forbid(unsafe_code)]

pub mod classify;
pub mod config;
pub mod diff;
pub mod error;
pub mod model;
pub mod planning;
pub mod store;
pub mod summary;
