//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use sc4pack::exemplar::{FLAG_ARRAY, SubHeader};
use sc4pack::format::{group_id, type_id};
use sc4pack::{Package, ResourceKey, Timestamp, WriteOptions, write};

/// Fixed creation time so written packages are reproducible.
pub const FIXED_TIME: u32 = 1_700_000_000;

/// Write options with fixed timestamps.
pub fn fixed_options() -> WriteOptions {
    WriteOptions::default().timestamps(Timestamp::from_unix_secs(FIXED_TIME))
}

/// Writes entries into an in-memory package with fixed timestamps.
pub fn compose_package(entries: &[(ResourceKey, &[u8])]) -> Vec<u8> {
    write::compose(entries.iter().copied(), &fixed_options()).expect("compose package")
}

/// Writes and re-parses a package.
pub fn parsed_package(entries: &[(ResourceKey, &[u8])]) -> Package {
    Package::parse(compose_package(entries)).expect("parse composed package")
}

/// Key of a lot configuration exemplar.
pub fn lot_key(instance_id: u32) -> ResourceKey {
    ResourceKey::new(type_id::EXEMPLAR, group_id::LOT_CONFIGURATION, instance_id)
}

/// Encodes `data` as a RefPack stream made of literal runs only.
pub fn literal_stream(data: &[u8]) -> Vec<u8> {
    let size = data.len() as u32;
    let mut out = vec![0x10, 0xFB];
    out.extend_from_slice(&size.to_be_bytes()[1..]);

    let mut rest = data;
    while rest.len() >= 4 {
        let n = (rest.len() / 4 * 4).min(112);
        out.push(0xE0 + ((n - 4) / 4) as u8);
        out.extend_from_slice(&rest[..n]);
        rest = &rest[n..];
    }
    out.push(0xFC + rest.len() as u8);
    out.extend_from_slice(rest);
    out
}

/// Prefixes a stream with the 4-byte compressed-size wrapper.
pub fn wrap(stream: &[u8]) -> Vec<u8> {
    let mut out = ((stream.len() + 4) as u32).to_le_bytes().to_vec();
    out.extend_from_slice(stream);
    out
}

/// Compresses `data` into a wrapped entry.
pub fn compressed_entry(data: &[u8]) -> Vec<u8> {
    wrap(&literal_stream(data))
}

/// One canonical property record.
pub fn record(id: u32, tag: u16, array: bool, count: u16, payload: &[u8]) -> Vec<u8> {
    let flags: u16 = if array { FLAG_ARRAY } else { 0 };
    let mut out = Vec::new();
    out.extend_from_slice(&id.to_le_bytes());
    out.extend_from_slice(&tag.to_le_bytes());
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&count.to_be_bytes());
    out.extend_from_slice(&[0, 0, 0]);
    out.extend_from_slice(payload);
    out
}

/// An Exemplar resource: sub-header, count, then `records`.
pub fn exemplar_resource(records: &[Vec<u8>]) -> Vec<u8> {
    let mut out = SubHeader::exemplar().to_bytes().to_vec();
    out.extend_from_slice(&(records.len() as u32).to_le_bytes());
    for r in records {
        out.extend_from_slice(r);
    }
    out
}

/// Random bytes from a fixed seed.
pub fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill(&mut data[..]);
    data
}
