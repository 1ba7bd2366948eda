//! `create`: build and write a Setup.bin file

use std::fs;

use anyhow::{Context, Result};
use setupbin_protocol::SetupBinCodec;
use tracing::{debug, info};

use crate::commands::CreateArgs;
use crate::image;
use crate::output::{self, CreateReport};
use crate::profile::ProvisioningProfile;

/// Execute create command
pub fn execute(args: &CreateArgs, codec: &SetupBinCodec, json: bool) -> Result<()> {
    let profile = resolve_profile(args)?;
    let vars = profile.variables(codec.registry())?;
    let count = vars.len();

    info!(path = %args.path.display(), variables = count, "creating the AMT Setup.bin file");
    let bytes = codec.build_from_names(vars)?;
    fs::write(&args.path, &bytes)
        .with_context(|| format!("failed to write {}", args.path.display()))?;

    let written = fs::read(&args.path)
        .with_context(|| format!("failed to read back {}", args.path.display()))?;
    let decoded = codec.decode_to_names(&written)?;
    debug!(bytes = written.len(), variables = decoded.len(), "verified written file");
    if args.debug && !json {
        output::print_decoded(&decoded);
    }

    let image = if args.no_image {
        None
    } else {
        Some(image::build_image(&args.image_tool, &args.path)?)
    };

    let report = CreateReport {
        path: args.path.clone(),
        bytes: bytes.len(),
        variables: count,
        image,
    };
    output::print_created(&report, args.debug.then_some(decoded.as_slice()), json);
    Ok(())
}

/// Defaults, then the profile file, then flags, then `--set`.
fn resolve_profile(args: &CreateArgs) -> Result<ProvisioningProfile> {
    let mut profile = match &args.profile {
        Some(path) => ProvisioningProfile::load(path)?,
        None => ProvisioningProfile::default(),
    };
    if let Some(password) = &args.current_password {
        profile.current_password.clone_from(password);
    }
    if let Some(password) = &args.new_password {
        profile.new_password.clone_from(password);
    }
    if let Some(certificate) = &args.certificate {
        profile.certificate = Some(certificate.clone());
    }
    if let Some(suffix) = &args.pki_dns_suffix {
        profile.pki_dns_suffix = Some(suffix.clone());
    }
    for assignment in &args.set {
        profile.set(assignment.clone());
    }
    Ok(profile)
}
