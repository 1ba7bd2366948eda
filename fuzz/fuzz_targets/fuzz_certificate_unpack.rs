//! Fuzzes certificate field unpacking and "<hash> <name>" parsing.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_certificate_unpack
#![no_main]
use libfuzzer_sys::fuzz_target;
use setupbin_protocol::{CertificateField, CertificateSpec};

fuzz_target!(|data: &[u8]| {
    let _ = CertificateField::unpack(data);
    if let Ok(text) = std::str::from_utf8(data)
        && let Ok(spec) = CertificateSpec::parse(text)
    {
        let _ = spec.pack();
    }
});
