//! Stable exit codes for harness CLI commands.

/// Command succeeded; for `harness run` an envelope was written.
pub const OK: i32 = 0;
/// Invalid usage, unknown script, bad config, or an I/O failure.
pub const INVALID: i32 = 1;
/// `harness parse` decoded an envelope carrying an error, or found none.
pub const SCRIPT_ERROR: i32 = 2;
