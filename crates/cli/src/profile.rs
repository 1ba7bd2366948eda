//! Provisioning profiles
//!
//! A profile is the set of inputs that decides which variables go into a
//! Setup.bin file. It starts from the built-in defaults, can be loaded from a
//! YAML or JSON file, and is then overridden by command-line flags.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use setupbin_protocol::prelude::*;
use setupbin_protocol::CERTIFICATE_ADDITION;
use tracing::debug;

use crate::error::CliError;

pub const DEFAULT_CURRENT_PASSWORD: &str = "admin";
pub const DEFAULT_NEW_PASSWORD: &str = "HeyH0Password!";
pub const DEFAULT_POWER_PACKAGE: &str = "46732273-DC23-2F43-A98A-13D37982D855";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProvisioningProfile {
    pub current_password: String,
    pub new_password: String,
    pub power_package: String,
    /// `"<sha256-hex> <name>"`
    pub certificate: Option<String>,
    pub pki_dns_suffix: Option<String>,
    pub variables: Vec<VariableOverride>,
}

impl Default for ProvisioningProfile {
    fn default() -> Self {
        Self {
            current_password: DEFAULT_CURRENT_PASSWORD.to_string(),
            new_password: DEFAULT_NEW_PASSWORD.to_string(),
            power_package: DEFAULT_POWER_PACKAGE.to_string(),
            certificate: None,
            pki_dns_suffix: None,
            variables: Vec::new(),
        }
    }
}

/// A single `name = value` override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableOverride {
    pub name: String,
    pub value: OverrideValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverrideValue {
    Integer(i64),
    Text(String),
}

impl OverrideValue {
    /// Convert to a value of the variable's declared type.
    pub fn to_value(&self, ty: VariableType) -> Result<Value, SetupBinError> {
        match (self, ty) {
            (Self::Integer(n), VariableType::String) => Ok(Value::text(n.to_string())),
            (Self::Integer(n), ty) => Value::from_integer(ty, *n),
            (Self::Text(text), ty) => Value::parse(ty, text),
        }
    }
}

/// clap value parser for `--set NAME=VALUE`.
pub fn parse_assignment(input: &str) -> Result<VariableOverride, String> {
    let (name, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {input:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing variable name in {input:?}"));
    }
    Ok(VariableOverride {
        name: name.to_string(),
        value: OverrideValue::Text(value.to_string()),
    })
}

impl ProvisioningProfile {
    /// Load a profile file. `.json` files are read as JSON, anything else as
    /// YAML.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::InvalidProfile(format!("cannot read {}: {e}", path.display()))
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let profile = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        debug!(path = %path.display(), json = is_json, "loaded provisioning profile");
        Ok(profile)
    }

    /// Replace an existing override of the same name or append a new one.
    pub fn set(&mut self, assignment: VariableOverride) {
        match self
            .variables
            .iter_mut()
            .find(|existing| existing.name == assignment.name)
        {
            Some(existing) => existing.value = assignment.value,
            None => self.variables.push(assignment),
        }
    }

    /// The ordered variable list this profile provisions.
    ///
    /// The default variables come first, then the certificate pair and the
    /// PKI DNS suffix when configured. Each override replaces the variable of
    /// the same name in place or is appended.
    pub fn variables(&self, registry: &VariableRegistry) -> Result<Vec<(String, Value)>, CliError> {
        let mut vars: Vec<(String, Value)> = vec![
            named("Current MEBx Password", Value::text(&self.current_password)),
            named("New MEBx Password", Value::text(&self.new_password)),
            named("Manageability Feature Selection", Value::I8(1)),
            named("Power Package", Value::guid(&self.power_package)?),
            named("SOL/IDER Redirection Configuration", Value::I8(7)),
            named("DHCP", Value::I8(2)),
            named("Shared/Dedicated FQDN", Value::I8(1)),
            named("Remote Desktop (KVM) State", Value::I8(1)),
            named("Opt-in User Consent Option", Value::I8(0)),
            named("Opt-in Remote IT Consent Policy", Value::I8(1)),
        ];

        if let Some(certificate) = &self.certificate {
            let spec = CertificateSpec::parse(certificate)?;
            vars.push(named(CERTIFICATE_ADDITION, Value::Text(spec.pack()?)));
            vars.push(named("Pre-Installed Certificates Enabled", Value::I8(0)));
        }
        if let Some(suffix) = &self.pki_dns_suffix {
            vars.push(named("PKI DNS Suffix", Value::text(suffix)));
        }

        for assignment in &self.variables {
            let definition = registry.resolve_by_name(&assignment.name)?;
            let value = assignment.value.to_value(definition.variable_type())?;
            match vars.iter_mut().find(|(name, _)| *name == assignment.name) {
                Some(slot) => slot.1 = value,
                None => vars.push((assignment.name.clone(), value)),
            }
        }
        Ok(vars)
    }
}

fn named(name: &str, value: Value) -> (String, Value) {
    (name.to_string(), value)
}
