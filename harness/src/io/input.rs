//! Input decoding from the environment-supplied JSON payload.

use std::env;

use crate::core::arguments::{Arguments, parse_arguments};
use crate::io::interceptor::Console;

/// Decoded invocation input.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedInput {
    pub args: Arguments,
    /// Whether a payload was present and decoded successfully.
    pub supplied: bool,
}

impl DecodedInput {
    fn absent() -> Self {
        Self {
            args: Arguments::empty(),
            supplied: false,
        }
    }
}

/// Read the raw payload from `var`. Unset or non-unicode values read as absent.
pub fn read_input(var: &str) -> Option<String> {
    env::var(var).ok()
}

/// Decode `raw` into arguments, recording the outcome as a console line.
///
/// Absent, empty or malformed payloads never fail the invocation: they yield
/// empty arguments with `supplied = false`.
pub fn decode_input(raw: Option<&str>, console: &Console) -> DecodedInput {
    let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
        return DecodedInput::absent();
    };
    match parse_arguments(raw) {
        Ok(args) => {
            console.print(format_args!("received input: {raw}"));
            DecodedInput {
                args,
                supplied: true,
            }
        }
        Err(err) => {
            console.print(format_args!("failed to parse input: {err:#}"));
            DecodedInput::absent()
        }
    }
}
