//! I/O side of the crate: worker isolation, process control and configuration.

pub mod config;
pub mod grid_store;
pub mod harness;
pub mod memory;
pub mod process;
pub mod worker;
