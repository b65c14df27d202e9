//! Stable exit codes for `crossing` and `bench` commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed: unreadable or malformed input, bad config, or any other error.
pub const INVALID: i32 = 1;
