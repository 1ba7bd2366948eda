//! Output formatting for CLI responses

use std::path::PathBuf;

use anyhow::Error;
use colored::*;
use serde::Serialize;
use serde_json::json;
use setupbin_protocol::prelude::*;
use setupbin_protocol::{CERTIFICATE_ADDITION, CONSUME_RECORDS};

use crate::error::{CliError, exit_code};

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "type": error_type_name(error),
            "exit_code": exit_code(error)
        }
    });
    print_json(&error_json, "error");
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

/// Result of `create`.
#[derive(Debug, Serialize)]
pub struct CreateReport {
    pub path: PathBuf,
    pub bytes: usize,
    pub variables: usize,
    pub image: Option<PathBuf>,
}

/// Human listing of the variables read back from a freshly written file.
pub fn print_decoded(decoded: &[(String, Value)]) {
    println!("{}", "Decoded variables:".bold());
    for (name, value) in decoded {
        println!("  {}: {}", name, render_value(name, value, None));
    }
}

/// Print the outcome of `create`. JSON output carries the decoded variables
/// when `--debug` asked for them; human output lists them earlier through
/// [`print_decoded`].
pub fn print_created(report: &CreateReport, decoded: Option<&[(String, Value)]>, json: bool) {
    if json {
        let mut output = json!({
            "success": true,
            "file": report
        });
        if let (Some(decoded), Some(map)) = (decoded, output.as_object_mut()) {
            map.insert("variables".to_string(), json!(named_values(decoded)));
        }
        print_json(&output, "create report");
        return;
    }

    println!(
        "{} Wrote {} ({} bytes, {} variables)",
        "✓".green(),
        report.path.display().to_string().bold(),
        report.bytes,
        report.variables
    );
    match &report.image {
        Some(image) => println!("{} Disk image {}", "✓".green(), image.display()),
        None => println!("{} Disk image skipped", "⚠".yellow()),
    }
}

/// Print a decoded container.
pub fn print_dump(container: &SetupBinContainer, registry: &VariableRegistry, json: bool) {
    let entries = container.records().iter().flat_map(Record::variables);

    if json {
        let variables: Vec<_> = entries
            .map(|entry| {
                json!({
                    "module_id": entry.module_id(),
                    "variable_id": entry.variable_id(),
                    "name": entry.name(),
                    "value": entry.value(),
                })
            })
            .collect();
        let output = json!({
            "success": true,
            "file_type": container.file_type(),
            "consume_records": container.consume_records() == CONSUME_RECORDS,
            "records_consumed": container.records_consumed(),
            "variables": variables
        });
        print_json(&output, "dump");
        return;
    }

    let consume = if container.consume_records() == CONSUME_RECORDS {
        "consumed on use"
    } else {
        "kept after use"
    };
    println!(
        "{} v{} (records {}, {} consumed)",
        "Setup.bin".bold(),
        container.file_type(),
        consume,
        container.records_consumed()
    );
    for entry in entries {
        let domain = registry
            .definition_by_id(entry.module_id(), entry.variable_id())
            .ok()
            .and_then(VariableDefinition::domain);
        println!(
            "  {} {}: {}",
            format!("[{}/{}]", entry.module_id(), entry.variable_id()).dimmed(),
            entry.name(),
            render_value(entry.name(), entry.value(), domain)
        );
    }
}

/// Print the registry listing.
pub fn print_registry(definitions: &[&VariableDefinition], json: bool) {
    if json {
        let output = json!({
            "success": true,
            "variables": definitions
        });
        print_json(&output, "variable list");
        return;
    }

    for definition in definitions {
        let domain = definition
            .domain()
            .map(|domain| format!(" ({domain})"))
            .unwrap_or_default();
        println!(
            "  {} {} {}{}",
            format!("[{}/{}]", definition.module_id(), definition.variable_id()).dimmed(),
            definition.name().bold(),
            definition.variable_type().to_string().cyan(),
            domain
        );
    }
}

fn named_values(vars: &[(String, Value)]) -> Vec<serde_json::Value> {
    vars.iter()
        .map(|(name, value)| json!({ "name": name, "value": value }))
        .collect()
}

fn render_value(name: &str, value: &Value, domain: Option<&Domain>) -> String {
    if name == CERTIFICATE_ADDITION
        && let Some(field) = value.as_bytes().and_then(|b| CertificateField::unpack(b).ok())
    {
        return format!("{:?} {} \"{}\"", field.algorithm, field.hash, field.name);
    }
    match domain.and_then(|domain| domain.describe(value)) {
        Some(label) => format!("{value} ({label})"),
        None => value.to_string(),
    }
}

fn print_json(value: &serde_json::Value, what: &str) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format {what} as JSON: {e}"),
    }
}

/// Variable name of the classified error, for machine output.
fn error_type_name(error: &Error) -> String {
    let debug = if let Some(cli) = error.downcast_ref::<CliError>() {
        match cli {
            CliError::SetupBin(inner) => format!("{inner:?}"),
            other => format!("{other:?}"),
        }
    } else if let Some(codec) = error.downcast_ref::<SetupBinError>() {
        format!("{codec:?}")
    } else {
        return "Error".to_string();
    };
    debug
        .split(['(', ' ', '{'])
        .next()
        .unwrap_or("Error")
        .to_string()
}
