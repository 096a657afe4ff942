//! Shared utilities.
//!
//! - [`tracing`]: Security, audit and reconciliation log events

pub mod tracing;
