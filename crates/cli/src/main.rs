//! setupbinctl - AMT Setup.bin provisioning CLI
//!
//! Creates, inspects and documents the Setup.bin files that provision
//! Intel AMT and MEBx settings from a USB key.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod completion;
mod error;
mod image;
mod output;
mod profile;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use setupbin_protocol::{SetupBinCodec, VariableRegistry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{CreateArgs, VariablesArgs};

#[derive(Parser)]
#[command(name = "setupbinctl")]
#[command(about = "AMT Setup.bin tool - Create and inspect AMT USB provisioning files")]
#[command(version)]
#[command(long_about = "
setupbinctl builds the Setup.bin file that the Intel management engine reads
from a USB key at boot to provision MEBx and AMT settings, and decodes existing
files for inspection.

Use --json flag for machine-readable output suitable for scripting.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a Setup.bin file and its disk image
    Create(CreateArgs),

    /// Decode a Setup.bin file and print its variables
    Dump {
        /// Setup.bin file to decode
        path: PathBuf,
    },

    /// List the variables a Setup.bin file can carry
    Variables(VariablesArgs),

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("setupbinctl={log_level},setupbin_protocol={log_level}").into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            ExitCode::from(error::exit_code(&e))
        }
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Create(args) => commands::create::execute(args, &amt_codec()?, cli.json),
        Commands::Dump { path } => commands::dump::execute(path, &amt_codec()?, cli.json),
        Commands::Variables(args) => {
            commands::variables::execute(args, &VariableRegistry::amt()?, cli.json)
        }
        Commands::Completion { shell } => {
            completion::generate_completion(*shell);
            Ok(())
        }
    }
}

fn amt_codec() -> Result<SetupBinCodec> {
    Ok(SetupBinCodec::new(Arc::new(VariableRegistry::amt()?)))
}
