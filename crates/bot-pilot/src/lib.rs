//! Library crate for bot-pilot.
//!
//! Exposes the position change watcher, the collaborator interfaces it
//! drives (board state providers and move models), and configuration
//! loading, for use by the binary and by tests.

pub mod config;
pub mod provider;
pub mod watch;
