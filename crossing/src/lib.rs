//! Minimum-cost left-to-right crossing of a toroidal cost grid.
//!
//! A path starts in column 0 at a chosen row and advances one column at a
//! time, moving to the row above, the same row, or the row below (rows wrap
//! around). Five interchangeable strategies find the cheapest such path, and
//! an execution harness runs each strategy in an isolated worker process
//! under a deadline, recording duration, cost and peak memory.
//!
//! - **[`core`]**: Pure, deterministic logic (grid, paths, strategies, records).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (worker protocol, child processes,
//!   heap accounting, configuration, the harness itself).

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
