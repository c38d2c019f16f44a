// crates/kie-core/src/core/hashing.rs
// ============================================================================
// Module: KIE Canonical Hashing
// Description: SHA-256 digests over raw bytes, files, and canonical JSON.
// Purpose: Give every artifact a stable, content-addressed identity.
// Dependencies: serde, serde_jcs, serde_json, sha2, thiserror
// ============================================================================

//! ## Overview
//! Every artifact the engine produces is referenced by path and SHA-256.
//! JSON artifacts are hashed over their RFC 8785 canonical form so that key
//! ordering and numeric representation never change the digest. Digests use
//! the wire form `sha256:<lowercase hex>`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default hash algorithm for all engine artifacts.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// Read-buffer size for streaming file hashing.
const FILE_HASH_BUFFER_BYTES: usize = 64 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Hashing errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum HashError {
    /// Canonical JSON serialization failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),
    /// Serialized value exceeds the permitted size.
    #[error("serialized value exceeds size limit ({actual} > {limit})")]
    SizeLimitExceeded {
        /// Maximum permitted size in bytes.
        limit: usize,
        /// Actual serialized size in bytes.
        actual: usize,
    },
    /// Reading the target file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// A digest string did not match the expected wire form.
    #[error("malformed digest: {0}")]
    MalformedDigest(String),
}

// ============================================================================
// SECTION: Digest Types
// ============================================================================

/// Supported hash algorithms.
///
/// # Invariants
/// - Variants are stable for serialization and evidence matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256.
    Sha256,
}

impl HashAlgorithm {
    /// Returns the canonical wire prefix of the algorithm.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

/// Content digest with its producing algorithm.
///
/// # Invariants
/// - `value` is lowercase hexadecimal.
/// - Serializes as `sha256:<hex>` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HashDigest {
    /// Algorithm that produced the digest.
    pub algorithm: HashAlgorithm,
    /// Lowercase hexadecimal digest value.
    pub value: String,
}

impl HashDigest {
    /// Creates a digest from an algorithm and a lowercase hex value.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, value: impl Into<String>) -> Self {
        Self {
            algorithm,
            value: value.into(),
        }
    }
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm.as_str(), self.value)
    }
}

impl From<HashDigest> for String {
    fn from(digest: HashDigest) -> Self {
        digest.to_string()
    }
}

impl TryFrom<String> for HashDigest {
    type Error = HashError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let Some((prefix, hex)) = value.split_once(':') else {
            return Err(HashError::MalformedDigest(value));
        };
        if prefix != HashAlgorithm::Sha256.as_str() {
            return Err(HashError::MalformedDigest(value));
        }
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(HashError::MalformedDigest(value));
        }
        Ok(Self::new(HashAlgorithm::Sha256, hex.to_ascii_lowercase()))
    }
}

// ============================================================================
// SECTION: Hash Functions
// ============================================================================

/// Hashes raw bytes with the given algorithm.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(bytes);
            HashDigest::new(algorithm, hex_encode(&hasher.finalize()))
        }
    }
}

/// Hashes a file's contents by streaming it through the digest.
///
/// # Errors
///
/// Returns [`HashError::Io`] when the file cannot be opened or read.
pub fn hash_file(algorithm: HashAlgorithm, path: &Path) -> Result<HashDigest, HashError> {
    let io_error = |source| HashError::Io {
        path: path.display().to_string(),
        source,
    };
    let mut file = File::open(path).map_err(io_error)?;
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            let mut buffer = vec![0_u8; FILE_HASH_BUFFER_BYTES];
            loop {
                let read = file.read(&mut buffer).map_err(io_error)?;
                if read == 0 {
                    break;
                }
                hasher.update(&buffer[..read]);
            }
            Ok(HashDigest::new(algorithm, hex_encode(&hasher.finalize())))
        }
    }
}

/// Serializes a value to RFC 8785 canonical JSON bytes.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails, which
/// includes non-finite floats.
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Serializes a value to canonical JSON bytes, enforcing a size limit.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] on serialization failure and
/// [`HashError::SizeLimitExceeded`] when the result exceeds `max_bytes`.
pub fn canonical_json_bytes_with_limit<T: Serialize>(
    value: &T,
    max_bytes: usize,
) -> Result<Vec<u8>, HashError> {
    let bytes = canonical_json_bytes(value)?;
    if bytes.len() > max_bytes {
        return Err(HashError::SizeLimitExceeded {
            limit: max_bytes,
            actual: bytes.len(),
        });
    }
    Ok(bytes)
}

/// Hashes a value over its canonical JSON form.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn hash_canonical_json<T: Serialize>(
    algorithm: HashAlgorithm,
    value: &T,
) -> Result<HashDigest, HashError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(hash_bytes(algorithm, &bytes))
}

/// Encodes bytes as lowercase hexadecimal.
fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = fmt::Write::write_fmt(&mut out, format_args!("{byte:02x}"));
    }
    out
}
