//! Command implementations for the newcode CLI.
//!
//! Each submodule implements the logic for a command group.

pub mod agents;
pub mod config;
pub mod doctor;
pub mod plugins;
pub mod tools;
