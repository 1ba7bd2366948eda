//! `dump`: decode and print a Setup.bin file

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use setupbin_protocol::SetupBinCodec;
use tracing::debug;

use crate::output;

/// Execute dump command
pub fn execute(path: &Path, codec: &SetupBinCodec, json: bool) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "decoding Setup.bin file");
    let container = codec.decode(&bytes)?;
    output::print_dump(&container, codec.registry(), json);
    Ok(())
}
