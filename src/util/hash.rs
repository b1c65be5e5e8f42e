//! Hashing utilities for content addressing.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// Compute SHA256 hash of a byte slice.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute SHA256 hash of a string.
pub fn sha256_str(s: &str) -> String {
    sha256_bytes(s.as_bytes())
}

/// Compute SHA256 hash of a file.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute a content hash over a directory tree.
///
/// The hash covers relative paths and file contents in sorted order, so
/// equal trees hash equally regardless of location. VCS metadata (`.git`)
/// is excluded.
pub fn hash_tree(root: &Path) -> Result<String> {
    let mut hasher = Sha256::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");

    for entry in walker {
        let entry = entry.with_context(|| format!("failed to walk tree: {}", root.display()))?;
        let rel = entry
            .path()
            .strip_prefix(root)
            .expect("walked entries live under the root");
        if rel.as_os_str().is_empty() {
            continue;
        }

        hasher.update(rel.to_string_lossy().as_bytes());
        hasher.update(b"\0");

        if entry.file_type().is_file() {
            let mut reader = BufReader::new(File::open(entry.path()).with_context(|| {
                format!("failed to open file for hashing: {}", entry.path().display())
            })?);
            let mut buffer = [0u8; 8192];
            loop {
                let bytes_read = reader.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }
            hasher.update(b"\0");
        }
    }

    Ok(hex::encode(hasher.finalize()))
}
