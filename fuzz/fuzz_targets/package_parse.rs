//! Fuzz target for Package::parse with arbitrary byte input.
//!
//! Parses the input as a package, then reads, decompresses and decodes every
//! entry it lists.
//!
//! Run with: cargo +nightly fuzz run package_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use sc4pack::exemplar::{self, DecodeOptions, LayoutPolicy};

fuzz_target!(|data: &[u8]| {
    let Ok(package) = sc4pack::Package::parse(data) else {
        return;
    };
    let sniff = DecodeOptions::new().layout(LayoutPolicy::Sniff);
    for entry in package.entries() {
        let Ok(bytes) = package.read_decompressed(entry.key) else {
            continue;
        };
        let _ = exemplar::decode_resource(&bytes, &DecodeOptions::default());
        let _ = exemplar::decode_resource(&bytes, &sniff);
        let _ = sc4pack::patch::inspect(entry.key, &bytes);
    }
});
