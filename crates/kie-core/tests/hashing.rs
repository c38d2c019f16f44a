// crates/kie-core/tests/hashing.rs
// ============================================================================
// Module: Canonical Hashing Tests
// Description: Verifies canonical JSON hashing and digest wire forms.
// ============================================================================
//! ## Overview
//! Ensures canonical JSON hashing is deterministic across key ordering,
//! digest strings round-trip through their wire form, and file hashing
//! matches byte hashing.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;

use kie_core::HashAlgorithm;
use kie_core::HashDigest;
use kie_core::hashing::canonical_json_bytes_with_limit;
use kie_core::hashing::hash_bytes;
use kie_core::hashing::hash_canonical_json;
use kie_core::hashing::hash_file;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

#[test]
fn canonical_hash_is_order_independent_for_maps() {
    let mut map_a = Map::new();
    map_a.insert("b".to_string(), json!(2));
    map_a.insert("a".to_string(), json!(1));

    let mut map_b = Map::new();
    map_b.insert("a".to_string(), json!(1));
    map_b.insert("b".to_string(), json!(2));

    let hash_a =
        hash_canonical_json(HashAlgorithm::Sha256, &Value::Object(map_a)).expect("hash a");
    let hash_b =
        hash_canonical_json(HashAlgorithm::Sha256, &Value::Object(map_b)).expect("hash b");
    assert_eq!(hash_a, hash_b);
}

#[test]
fn byte_hash_is_stable() {
    let digest = hash_bytes(HashAlgorithm::Sha256, b"kie");
    assert_eq!(digest, hash_bytes(HashAlgorithm::Sha256, b"kie"));
    assert_ne!(digest, hash_bytes(HashAlgorithm::Sha256, b"other"));
}

#[test]
fn digest_wire_form_round_trips() {
    let digest = hash_bytes(HashAlgorithm::Sha256, b"kie");
    let wire = digest.to_string();
    assert!(wire.starts_with("sha256:"));
    let parsed = HashDigest::try_from(wire).expect("parse digest");
    assert_eq!(parsed, digest);
}

#[test]
fn malformed_digests_are_rejected() {
    assert!(HashDigest::try_from("md5:abcd".to_string()).is_err());
    assert!(HashDigest::try_from("sha256:".to_string()).is_err());
    assert!(HashDigest::try_from("sha256:zzzz".to_string()).is_err());
    assert!(HashDigest::try_from("no-colon".to_string()).is_err());
}

#[test]
fn size_limit_is_enforced() {
    let value = json!({"key": "a".repeat(64)});
    let err = canonical_json_bytes_with_limit(&value, 8).expect_err("limit");
    assert!(err.to_string().contains("size limit"));
}

#[test]
fn file_hash_matches_byte_hash() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("artifact.json");
    fs::write(&path, b"{\"a\":1}").expect("write");
    let from_file = hash_file(HashAlgorithm::Sha256, &path).expect("hash file");
    let from_bytes = hash_bytes(HashAlgorithm::Sha256, b"{\"a\":1}");
    assert_eq!(from_file, from_bytes);
}
