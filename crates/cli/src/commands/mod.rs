//! CLI subcommands

pub mod batch;
pub mod config;
pub mod health;
pub mod predict;
