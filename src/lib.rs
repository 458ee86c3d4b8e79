//! sysopt - syscall performance optimizer
//!
//! This library keeps running statistics for observed system calls together
//! with the resource impact measured around each observation, and derives
//! prioritized optimization recommendations from them, optionally enriched by
//! a pluggable suggestion backend.

pub mod cli;
pub mod config;
pub mod engine;
pub mod feed;
pub mod optimizer;
pub mod record;
pub mod report;
pub mod resources;
pub mod store;
pub mod strategy;
pub mod suggest;
pub mod syscalls;
pub mod task;
