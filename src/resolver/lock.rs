//! Lock files - pinning a path flake's direct inputs.
//!
//! A lock maps each direct input name of a local flake to the fully
//! concrete reference it resolved to, freezing the input until the next
//! explicit update.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::reference::FlakeRef;

/// Lock file name, sibling of the flake manifest.
pub const LOCK_FILE_NAME: &str = "Floe.lock";

/// Lock file format version.
pub const LOCK_VERSION: u32 = 1;

/// Error reading or writing a lock file.
#[derive(Debug, Error)]
#[error("invalid lock file `{path}`: {message}")]
pub struct LockError {
    pub path: PathBuf,
    pub message: String,
}

/// One pinned input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedInput {
    pub name: String,
    pub reference: FlakeRef,
}

/// The persisted pin of a path flake's direct inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockFile {
    version: u32,
    #[serde(rename = "input", default)]
    inputs: Vec<LockedInput>,
}

impl Default for LockFile {
    fn default() -> Self {
        LockFile {
            version: LOCK_VERSION,
            inputs: Vec::new(),
        }
    }
}

impl LockFile {
    pub fn new(inputs: Vec<LockedInput>) -> Self {
        LockFile {
            version: LOCK_VERSION,
            inputs,
        }
    }

    /// Pinned inputs in order.
    pub fn inputs(&self) -> &[LockedInput] {
        &self.inputs
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Look up the pinned reference for an input name.
    pub fn get(&self, name: &str) -> Option<&FlakeRef> {
        self.inputs
            .iter()
            .find(|i| i.name == name)
            .map(|i| &i.reference)
    }

    /// Load a lock file. A missing file means "no pins yet" and loads as
    /// an empty lock, never as an error.
    pub fn load(path: &Path) -> Result<Self, LockError> {
        if !path.exists() {
            return Ok(LockFile::default());
        }

        let err = |message: String| LockError {
            path: path.to_path_buf(),
            message,
        };

        let content = std::fs::read_to_string(path).map_err(|e| err(e.to_string()))?;
        let lock: LockFile = toml::from_str(&content).map_err(|e| err(e.to_string()))?;

        if lock.version != LOCK_VERSION {
            return Err(err(format!("unsupported version {}", lock.version)));
        }
        for input in &lock.inputs {
            if input.reference.is_indirect() {
                return Err(err(format!(
                    "input `{}` is pinned to the non-concrete reference `{}`",
                    input.name, input.reference
                )));
            }
        }

        Ok(lock)
    }

    /// Persist the lock, overwriting any previous version.
    pub fn save(&self, path: &Path) -> Result<(), LockError> {
        let err = |message: String| LockError {
            path: path.to_path_buf(),
            message,
        };

        let content = toml::to_string_pretty(self).map_err(|e| err(e.to_string()))?;
        let with_header = format!(
            "# This file is automatically generated by Floe.\n\
             # It is not intended for manual editing.\n\n\
             {content}"
        );
        std::fs::write(path, with_header).map_err(|e| err(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rev(n: u8) -> String {
        format!("{:040x}", n)
    }

    #[test]
    fn test_load_missing_is_empty() {
        let tmp = TempDir::new().unwrap();
        let lock = LockFile::load(&tmp.path().join(LOCK_FILE_NAME)).unwrap();
        assert!(lock.is_empty());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(LOCK_FILE_NAME);

        let lock = LockFile::new(vec![
            LockedInput {
                name: "nixpkgs".to_string(),
                reference: FlakeRef::parse(&format!("github:NixOS/nixpkgs?rev={}", rev(1)))
                    .unwrap(),
            },
            LockedInput {
                name: "lib".to_string(),
                reference: FlakeRef::parse(&format!("github:x/lib?rev={}", rev(2))).unwrap(),
            },
        ]);
        lock.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# This file is automatically generated"));

        let loaded = LockFile::load(&path).unwrap();
        assert_eq!(loaded, lock);
        assert_eq!(loaded.get("lib"), Some(&FlakeRef::parse(&format!("github:x/lib?rev={}", rev(2))).unwrap()));
        assert_eq!(loaded.get("missing"), None);
    }

    #[test]
    fn test_load_rejects_indirect_pin() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(LOCK_FILE_NAME);
        std::fs::write(
            &path,
            "version = 1\n\n[[input]]\nname = \"x\"\nreference = \"some-alias\"\n",
        )
        .unwrap();

        let err = LockFile::load(&path).unwrap_err();
        assert!(err.to_string().contains("non-concrete"));
    }

    #[test]
    fn test_load_rejects_unknown_version() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(LOCK_FILE_NAME);
        std::fs::write(&path, "version = 9\n").unwrap();

        assert!(LockFile::load(&path).is_err());
    }
}
