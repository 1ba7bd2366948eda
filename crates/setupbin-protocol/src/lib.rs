//! Variable registry and binary codec for AMT Setup.bin provisioning files
//!
//! A Setup.bin file carries MEBx and AMT configuration variables (passwords,
//! policy flags, GUIDs, a trusted certificate hash) in a scrambled,
//! chunk-framed record that the management engine applies at boot.
//!
//! # Architecture
//!
//! - [`catalog`]: the built-in (module, variable) → type/name catalog
//! - [`registry`]: immutable name ↔ identifier lookup built from a catalog
//! - [`codec`]: per-type value serialization
//! - [`scramble`]: reversible integrity transforms applied to record payloads
//! - [`container`]: file header and record framing, plus the top-level codec
//! - [`certificate`]: packing of the certificate hash variable
//! - [`error`]: error types
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use setupbin_protocol::prelude::*;
//!
//! # fn main() -> Result<(), SetupBinError> {
//! let codec = SetupBinCodec::new(Arc::new(VariableRegistry::amt()?));
//! let bytes = codec.build_from_names([
//!     ("Current MEBx Password", Value::text("admin")),
//!     ("DHCP", Value::I8(2)),
//! ])?;
//! let decoded = codec.decode_to_names(&bytes)?;
//! assert_eq!(decoded.len(), 2);
//! # Ok(())
//! # }
//! ```

#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod catalog;
pub mod certificate;
pub mod codec;
pub mod container;
pub mod error;
pub mod prelude;
pub mod registry;
pub mod scramble;
pub mod types;
pub mod wire;

pub use catalog::{CERTIFICATE_ADDITION, Catalog, CatalogEntry, amt_catalog};
pub use certificate::{CertificateField, CertificateSpec, HashAlgorithm, MAX_NAME_LEN, pack};
pub use codec::{decode_value, encode_value};
pub use container::{
    CHUNK_SIZE, CONSUME_RECORDS, DO_NOT_CONSUME, Record, RecordFlags, RecordType,
    SUPPORTED_FILE_TYPE, SetupBinCodec, SetupBinContainer, file_type_signature,
};
pub use error::{SetupBinError, SetupBinResult};
pub use registry::VariableRegistry;
pub use scramble::{ByteScrambler, IdentityTransform, IntegrityTransform};
pub use types::{Domain, Value, VariableDefinition, VariableEntry, VariableType};
