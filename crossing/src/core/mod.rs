//! Deterministic, pure logic: the grid, paths, search strategies and result records.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod algorithms;
pub mod grid;
pub mod path;
pub mod record;
