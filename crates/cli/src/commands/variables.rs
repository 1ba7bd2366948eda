//! `variables`: list the variable registry

use anyhow::Result;
use setupbin_protocol::VariableRegistry;

use crate::commands::VariablesArgs;
use crate::error::CliError;
use crate::output;

/// Execute variables command
pub fn execute(args: &VariablesArgs, registry: &VariableRegistry, json: bool) -> Result<()> {
    let definitions: Vec<_> = registry
        .definitions()
        .filter(|definition| args.module.is_none_or(|module| definition.module_id() == module))
        .collect();
    if let (Some(module), true) = (args.module, definitions.is_empty()) {
        return Err(CliError::InvalidArgument(format!("no variables in module {module}")).into());
    }
    output::print_registry(&definitions, json);
    Ok(())
}
