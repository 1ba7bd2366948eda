//! Disk image creation through the external image tool

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::CliError;

pub const DEFAULT_IMAGE_TOOL: &str = "amt-setupbin-img";

/// `Setup.bin` → `Setup.bin.img`
pub fn image_path(setup_bin: &Path) -> PathBuf {
    let mut path = setup_bin.as_os_str().to_owned();
    path.push(".img");
    PathBuf::from(path)
}

/// Run `<tool> -path=<setup_bin> -img-path=<setup_bin>.img` and wait for it.
pub fn build_image(tool: &Path, setup_bin: &Path) -> Result<PathBuf, CliError> {
    let image = image_path(setup_bin);
    info!(
        tool = %tool.display(),
        image = %image.display(),
        "creating the AMT Setup.bin disk image"
    );

    let output = Command::new(tool)
        .arg(format!("-path={}", setup_bin.display()))
        .arg(format!("-img-path={}", image.display()))
        .output()
        .map_err(|e| CliError::ImageTool(format!("failed to run {}: {e}", tool.display())))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CliError::ImageTool(format!(
            "{} exited with {}: {}",
            tool.display(),
            output.status,
            stderr.trim()
        )));
    }

    debug!(
        stdout = %String::from_utf8_lossy(&output.stdout).trim(),
        "image tool finished"
    );
    Ok(image)
}
