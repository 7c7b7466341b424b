//! Writes the final envelope line to the real output.

use std::io::Write;

use anyhow::{Context, Result};

use crate::core::envelope::ResultEnvelope;
use crate::core::json_text::to_json_text;

/// Write `envelope` as one JSON line and flush.
pub fn emit_envelope<W: Write + ?Sized>(out: &mut W, envelope: &ResultEnvelope) -> Result<()> {
    let mut line = to_json_text(envelope).context("serialize envelope")?;
    line.push('\n');
    out.write_all(line.as_bytes()).context("write envelope")?;
    out.flush().context("flush envelope")?;
    Ok(())
}
