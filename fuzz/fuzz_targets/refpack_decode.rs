//! Fuzz target for the RefPack decompressor.
//!
//! Run with: cargo +nightly fuzz run refpack_decode

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(out) = sc4pack::codec::decode(data, None) {
        let declared = sc4pack::codec::declared_size(data).unwrap_or_default();
        assert_eq!(out.len(), declared);
    }
});
