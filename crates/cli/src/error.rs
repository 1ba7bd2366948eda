//! Error types for setupbinctl

use setupbin_protocol::SetupBinError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Setup.bin error: {0}")]
    SetupBin(#[from] SetupBinError),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Image tool failed: {0}")]
    ImageTool(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::SetupBin(_) => 2,
            Self::InvalidProfile(_)
            | Self::InvalidArgument(_)
            | Self::JsonError(_)
            | Self::YamlError(_) => 3,
            Self::ImageTool(_) => 4,
            Self::IoError(_) => 1,
        }
    }
}

/// Process exit code for a failed command.
///
/// Library errors that reach `anyhow` without passing through [`CliError`]
/// are still classified as codec failures.
pub fn exit_code(error: &anyhow::Error) -> u8 {
    if let Some(cli) = error.downcast_ref::<CliError>() {
        return cli.exit_code();
    }
    if error.downcast_ref::<SetupBinError>().is_some() {
        return 2;
    }
    1
}
