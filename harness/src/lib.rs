//! Single-shot execution harness for user scripts.
//!
//! A run loads one script, invokes its `handler` or `main` entry point with
//! input decoded from an environment variable, and emits exactly one JSON
//! envelope bundling captured logs, the normalized result, and any error.
//!
//! - **[`core`]**: Pure logic (argument shaping, result normalization,
//!   failure rendering, the envelope type).
//! - **[`io`]**: Output/logging interception, input decoding, config, and
//!   envelope emission and decoding.
//!
//! [`run`] ties them together; [`script`] and [`dispatch`] define how user
//! code registers and is invoked.

pub mod core;
pub mod dispatch;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod run;
pub mod script;
pub mod scripts;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
