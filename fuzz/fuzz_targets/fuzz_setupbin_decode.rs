//! Fuzzes the Setup.bin decoder with arbitrary byte sequences.
//!
//! Any input that decodes must re-encode to a file that decodes to the same
//! variable list.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_setupbin_decode
#![no_main]
use std::sync::{Arc, LazyLock};

use libfuzzer_sys::fuzz_target;
use setupbin_protocol::{SetupBinCodec, VariableRegistry};

static CODEC: LazyLock<Option<SetupBinCodec>> =
    LazyLock::new(|| VariableRegistry::amt().ok().map(|r| SetupBinCodec::new(Arc::new(r))));

fuzz_target!(|data: &[u8]| {
    let Some(codec) = CODEC.as_ref() else {
        return;
    };
    let Ok(container) = codec.decode(data) else {
        return;
    };
    let Ok(bytes) = codec.encode(&container) else {
        return;
    };
    if let (Ok(first), Ok(second)) = (codec.decode_to_names(data), codec.decode_to_names(&bytes)) {
        assert_eq!(first, second);
    }
});
