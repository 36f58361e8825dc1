//! Workflow integration tests
//!
//! End-to-end checks of the binary and of the watcher driving the
//! extraction policy.

pub mod config_commands;
pub mod extraction;
