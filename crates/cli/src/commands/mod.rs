//! Command implementations for setupbinctl

pub mod create;
pub mod dump;
pub mod variables;

use std::path::PathBuf;

use clap::Args;

use crate::image::DEFAULT_IMAGE_TOOL;
use crate::profile::{VariableOverride, parse_assignment};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Output path of the Setup.bin file
    #[arg(short, long, default_value = "Setup.bin")]
    pub path: PathBuf,

    /// Provisioning profile (YAML, or JSON by extension)
    #[arg(long, env = "SETUPBIN_PROFILE")]
    pub profile: Option<PathBuf>,

    /// Current MEBx password
    #[arg(long)]
    pub current_password: Option<String>,

    /// New MEBx password
    #[arg(long)]
    pub new_password: Option<String>,

    /// Trusted root certificate as "<sha256-hex> <name>"
    #[arg(long, value_name = "HASH NAME")]
    pub certificate: Option<String>,

    /// PKI DNS suffix
    #[arg(long)]
    pub pki_dns_suffix: Option<String>,

    /// Set a variable by name, e.g. --set "DHCP=1" (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub set: Vec<VariableOverride>,

    /// Read the written file back and print its variables
    #[arg(long)]
    pub debug: bool,

    /// Skip building the disk image
    #[arg(long)]
    pub no_image: bool,

    /// Disk image tool to run after writing the file
    #[arg(long, env = "SETUPBIN_IMAGE_TOOL", default_value = DEFAULT_IMAGE_TOOL)]
    pub image_tool: PathBuf,
}

#[derive(Args, Debug)]
pub struct VariablesArgs {
    /// Only list variables of this module id
    #[arg(short, long)]
    pub module: Option<u16>,
}
