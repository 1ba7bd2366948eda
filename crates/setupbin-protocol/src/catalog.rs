//! Built-in AMT variable catalog
//!
//! Module 1 holds the MEBx settings, module 2 the AMT provisioning settings
//! and module 3 platform identity. Identifiers, type codes and choice codes
//! follow the vendor's `AmtSetupBinVarIds` table as published in
//! MeshCommander's `amt-setupbin.js`; the maximum lengths come from the
//! limits documented alongside it.

use std::collections::BTreeMap;

use crate::types::{Domain, VariableType};

/// Raw catalog row: wire type code, display name and optional domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub type_code: u8,
    pub name: String,
    pub domain: Option<Domain>,
}

impl CatalogEntry {
    pub fn new(type_code: u8, name: impl Into<String>, domain: Option<Domain>) -> Self {
        Self {
            type_code,
            name: name.into(),
            domain,
        }
    }
}

/// Module id → variable id → entry.
pub type Catalog = BTreeMap<u16, BTreeMap<u16, CatalogEntry>>;

pub const MODULE_MEBX: u16 = 1;
pub const MODULE_AMT: u16 = 2;
pub const MODULE_PLATFORM: u16 = 3;

/// Name of the String variable carrying a packed certificate descriptor.
pub const CERTIFICATE_ADDITION: &str = "User Defined Certificate Addition";

const STRING: u8 = VariableType::String as u8;
const INT8: u8 = VariableType::Int8 as u8;
const INT16: u8 = VariableType::Int16 as u8;
const INT32: u8 = VariableType::Int32 as u8;
const GUID: u8 = VariableType::Guid as u8;

fn on_off(off: &str, on: &str) -> Option<Domain> {
    Some(Domain::choices([(0, off), (1, on)]))
}

fn max_len(n: usize) -> Option<Domain> {
    Some(Domain::MaxLength(n))
}

fn module(entries: Vec<(u16, u8, &str, Option<Domain>)>) -> BTreeMap<u16, CatalogEntry> {
    entries
        .into_iter()
        .map(|(id, ty, name, domain)| (id, CatalogEntry::new(ty, name, domain)))
        .collect()
}

/// The AMT Setup.bin catalog.
pub fn amt_catalog() -> Catalog {
    let mebx = module(vec![
        (1, STRING, "Current MEBx Password", max_len(32)),
        (2, STRING, "New MEBx Password", max_len(32)),
        (3, INT8, "Manageability Feature Selection", on_off("None", "Intel AMT")),
        (
            4,
            INT8,
            "Firmware Local Update",
            Some(Domain::choices([
                (0, "Disabled"),
                (1, "Enabled"),
                (2, "Password Protected"),
            ])),
        ),
        (
            5,
            INT8,
            "Firmware Update Qualifier",
            Some(Domain::choices([(0, "Always"), (1, "Never"), (2, "Restricted")])),
        ),
        (6, GUID, "Power Package", None),
    ]);

    let amt = module(vec![
        (1, STRING, "Provisioning Preshared Key ID (PID)", max_len(8)),
        (2, STRING, "Provisioning Preshared Key (PPS)", max_len(32)),
        (3, STRING, "PKI DNS Suffix", max_len(255)),
        (4, STRING, "Configuration Server FQDN", max_len(255)),
        (5, INT8, "Remote Configuration Enabled (RCFG)", on_off("Off", "On")),
        (6, INT8, "Pre-Installed Certificates Enabled", on_off("Disabled", "Enabled")),
        (
            7,
            INT8,
            "User Defined Certificate Configuration",
            Some(Domain::choices([(0, "Disabled"), (1, "Enabled"), (2, "Delete")])),
        ),
        // tag + SHA-384 digest + length byte + 32-byte name
        (8, STRING, CERTIFICATE_ADDITION, max_len(82)),
        // bit 0 SOL, bit 1 IDER, bit 2 username/password authentication
        (
            10,
            INT8,
            "SOL/IDER Redirection Configuration",
            Some(Domain::choices([
                (0, "Disabled"),
                (1, "SOL"),
                (2, "IDER"),
                (3, "SOL + IDER"),
                (4, "User/Pass"),
                (5, "SOL + User/Pass"),
                (6, "IDER + User/Pass"),
                (7, "SOL + IDER + User/Pass"),
            ])),
        ),
        (11, STRING, "Hostname", max_len(63)),
        (12, STRING, "Domain Name", max_len(255)),
        (
            13,
            INT8,
            "DHCP",
            Some(Domain::choices([(1, "Disabled"), (2, "Enabled")])),
        ),
        (14, INT8, "Secure Firmware Update (SFWU)", on_off("Disabled", "Enabled")),
        // idle timeout, carried as text
        (15, STRING, "ITO", None),
        (
            16,
            INT8,
            "Provisioning Mode (PM)",
            on_off("Enterprise", "Small Business"),
        ),
        (17, STRING, "Provisioning Server Address", max_len(255)),
        (18, INT16, "Provisioning Server Port Number (PSPO)", None),
        (19, STRING, "Static PV4 Parameters", None),
        (20, STRING, "VLAN Parameters", None),
        (21, STRING, "PASS Policy Flag", None),
        (22, STRING, "IPv6", None),
        (23, INT8, "Shared/Dedicated FQDN", on_off("Dedicated", "Shared")),
        (24, INT8, "Dynamic DNS Update", on_off("Disabled", "Enabled")),
        (25, INT8, "Remote Desktop (KVM) State", on_off("Disabled", "Enabled")),
        // 0xFF on the wire
        (
            26,
            INT8,
            "Opt-in User Consent Option",
            Some(Domain::choices([(0, "Disabled"), (1, "KVM"), (-1, "All")])),
        ),
        (27, INT8, "Opt-in Remote IT Consent Policy", on_off("Disabled", "Enabled")),
        (28, INT8, "ME Provision Halt Active", on_off("Stop", "Start")),
        (29, INT8, "Manual Setup and Configuration", on_off("Automated", "Manual")),
        (30, INT32, "Support Channel Identifier", None),
        (31, STRING, "Support Channel Description", max_len(60)),
        (32, STRING, "Service Account Number", max_len(32)),
        (33, STRING, "Enrollment Passcode", max_len(32)),
        (34, INT32, "Service Type", None),
        (35, GUID, "Service Provider Identifier", None),
    ]);

    let platform = module(vec![(1, GUID, "Platform GUID", None)]);

    Catalog::from([
        (MODULE_MEBX, mebx),
        (MODULE_AMT, amt),
        (MODULE_PLATFORM, platform),
    ])
}
