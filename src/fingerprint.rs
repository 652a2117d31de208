//! Content fingerprints.
//!
//! Every post with content carries three digests of that content plus a
//! content-addressed `_id`. The `_id` mixes in the source file path so two
//! files with identical bodies still get distinct identities, while an
//! unchanged file keeps the same `_id` across builds.

use md5::Md5;
use serde::Serialize;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("unknown digest algorithm: {0}")]
    UnknownAlgo(String),
}

/// Digest algorithms available for fingerprinting, selected by name.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HashAlgo {
    Md5,
    Sha256,
    Sha512,
}

impl HashAlgo {
    /// Length of the hex-encoded digest.
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgo::Md5 => 32,
            HashAlgo::Sha256 => 64,
            HashAlgo::Sha512 => 128,
        }
    }
}

impl fmt::Display for HashAlgo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgo::Md5 => write!(f, "md5"),
            HashAlgo::Sha256 => write!(f, "sha256"),
            HashAlgo::Sha512 => write!(f, "sha512"),
        }
    }
}

impl TryFrom<&str> for HashAlgo {
    type Error = FingerprintError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        match name {
            "md5" => Ok(Self::Md5),
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(FingerprintError::UnknownAlgo(name.to_string())),
        }
    }
}

/// Lowercase hex digest of `text` under `algo`.
pub fn digest(algo: HashAlgo, text: &str) -> String {
    match algo {
        HashAlgo::Md5 => format!("{:x}", Md5::digest(text.as_bytes())),
        HashAlgo::Sha256 => format!("{:x}", Sha256::digest(text.as_bytes())),
        HashAlgo::Sha512 => format!("{:x}", Sha512::digest(text.as_bytes())),
    }
}

pub fn md5(text: &str) -> String {
    digest(HashAlgo::Md5, text)
}

pub fn sha256(text: &str) -> String {
    digest(HashAlgo::Sha256, text)
}

pub fn sha512(text: &str) -> String {
    digest(HashAlgo::Sha512, text)
}

/// The fingerprint fields attached to a post that has content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fingerprints {
    #[serde(rename = "_md5")]
    pub md5: String,
    #[serde(rename = "_sha256")]
    pub sha256: String,
    #[serde(rename = "_sha512")]
    pub sha512: String,
    /// SHA-256 of the source path immediately followed by the content.
    #[serde(rename = "_id")]
    pub id: String,
}

impl Fingerprints {
    pub fn compute(file: &str, content: &str) -> Self {
        Self {
            md5: md5(content),
            sha256: sha256(content),
            sha512: sha512(content),
            id: sha256(&format!("{file}{content}")),
        }
    }
}
