//! Deterministic logic shared by the harness.
//!
//! Core modules perform no I/O. They shape input, results and failures into
//! the values the envelope is built from.

pub mod arguments;
pub mod envelope;
pub mod failure;
pub mod json_text;
pub mod normalize;
