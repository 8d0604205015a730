//! logsieve daemon library.
//!
//! This library exposes internal modules for integration testing.
//! In production, `logsieve-daemon` is used as a binary (main.rs).

pub mod cli;
pub mod report;
pub mod runner;
pub mod settings;
