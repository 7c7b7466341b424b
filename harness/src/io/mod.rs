//! I/O side of the harness: interception, input, configuration and output.

pub mod bridge;
pub mod config;
pub mod emit;
pub mod input;
pub mod interceptor;
pub mod output;
