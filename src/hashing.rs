//! Artifact Digests - SHA-256
//!
//! Every artifact in a report carries the digest of the exact bytes written.

use sha2::{Digest, Sha256};
use std::path::Path;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Digest of a file currently on disk.
pub async fn sha256_file(path: &Path) -> Result<String, std::io::Error> {
    let data = tokio::fs::read(path).await?;
    Ok(sha256_hex(&data))
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}
