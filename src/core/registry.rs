//! Alias registries - ordered alias-to-reference mappings, one per tier.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::reference::FlakeRef;
use crate::util::fs;

/// Registry format version.
pub const REGISTRY_VERSION: u32 = 1;

/// Which tier of the lookup chain a registry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryTier {
    /// Ephemeral overrides from command-line flags. Never persisted.
    Flag,
    /// The user's own registry, persisted and writable.
    User,
    /// The shared global registry, read-mostly.
    Global,
}

impl fmt::Display for RegistryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryTier::Flag => write!(f, "flags"),
            RegistryTier::User => write!(f, "user"),
            RegistryTier::Global => write!(f, "global"),
        }
    }
}

/// Error mutating a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry entries must map an alias, got `{reference}`")]
    NotAnAlias { reference: String },
}

/// A single alias mapping. `from` is always an indirect reference; `to`
/// may be any reference, including another alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub from: FlakeRef,
    pub to: FlakeRef,
}

/// An ordered alias registry for one tier.
///
/// Entries are unique by alias name; decorations on the `from` reference do
/// not participate in keying ("same alias, track latest" semantics).
#[derive(Debug, Clone)]
pub struct Registry {
    tier: RegistryTier,
    entries: Vec<RegistryEntry>,
}

#[derive(Serialize, Deserialize)]
struct RegistryFile {
    version: u32,
    tier: String,
    #[serde(rename = "entry", default)]
    entries: Vec<RegistryEntry>,
}

impl Registry {
    /// Create an empty registry for the given tier.
    pub fn new(tier: RegistryTier) -> Self {
        Registry {
            tier,
            entries: Vec::new(),
        }
    }

    /// Load a registry from a path. A missing file is an empty registry,
    /// not an error.
    pub fn load(tier: RegistryTier, path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Registry::new(tier));
        }

        let content = fs::read_to_string(path)?;
        let file: RegistryFile = toml::from_str(&content)
            .with_context(|| format!("failed to parse registry file: {}", path.display()))?;

        if file.version != REGISTRY_VERSION {
            anyhow::bail!(
                "registry file {} has unsupported version {}",
                path.display(),
                file.version
            );
        }

        if file.tier != tier.to_string() {
            anyhow::bail!(
                "registry file {} is tagged `{}`, expected `{tier}`",
                path.display(),
                file.tier
            );
        }

        for entry in &file.entries {
            if !entry.from.is_indirect() {
                anyhow::bail!(
                    "registry file {} maps non-alias reference `{}`",
                    path.display(),
                    entry.from
                );
            }
        }

        Ok(Registry {
            tier,
            entries: file.entries,
        })
    }

    /// Persist the registry, preserving entry order.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = RegistryFile {
            version: REGISTRY_VERSION,
            tier: self.tier.to_string(),
            entries: self.entries.clone(),
        };
        let content = toml::to_string_pretty(&file)?;
        fs::write_string(path, &content)
    }

    /// Get the tier this registry belongs to.
    pub fn tier(&self) -> RegistryTier {
        self.tier
    }

    /// Entries in order.
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the target for an alias name.
    pub fn lookup(&self, alias: &str) -> Option<&FlakeRef> {
        self.entries
            .iter()
            .find(|e| e.from.alias() == Some(alias))
            .map(|e| &e.to)
    }

    /// Insert or overwrite the entry for an alias. An overwritten entry
    /// keeps its position.
    pub fn upsert(&mut self, from: FlakeRef, to: FlakeRef) -> Result<(), RegistryError> {
        let Some(alias) = from.alias().map(str::to_string) else {
            return Err(RegistryError::NotAnAlias {
                reference: from.to_string(),
            });
        };

        match self
            .entries
            .iter_mut()
            .find(|e| e.from.alias() == Some(alias.as_str()))
        {
            Some(entry) => {
                entry.from = from;
                entry.to = to;
            }
            None => self.entries.push(RegistryEntry { from, to }),
        }
        Ok(())
    }

    /// Remove the entry for an alias. Returns whether an entry existed.
    pub fn remove(&mut self, alias: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.from.alias() != Some(alias));
        self.entries.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn alias(name: &str) -> FlakeRef {
        FlakeRef::indirect(name).unwrap()
    }

    fn target(text: &str) -> FlakeRef {
        FlakeRef::parse(text).unwrap()
    }

    #[test]
    fn test_lookup_and_upsert() {
        let mut registry = Registry::new(RegistryTier::User);
        registry
            .upsert(alias("nixpkgs"), target("github:NixOS/nixpkgs"))
            .unwrap();

        assert_eq!(
            registry.lookup("nixpkgs"),
            Some(&target("github:NixOS/nixpkgs"))
        );
        assert_eq!(registry.lookup("missing"), None);
    }

    #[test]
    fn test_upsert_overwrites_in_place() {
        let mut registry = Registry::new(RegistryTier::User);
        registry.upsert(alias("a"), target("github:x/a")).unwrap();
        registry.upsert(alias("b"), target("github:x/b")).unwrap();
        registry.upsert(alias("a"), target("github:y/a")).unwrap();

        assert_eq!(registry.entries().len(), 2);
        assert_eq!(registry.entries()[0].to, target("github:y/a"));
        assert_eq!(registry.entries()[1].to, target("github:x/b"));
    }

    #[test]
    fn test_upsert_keys_on_alias_not_decorations() {
        let mut registry = Registry::new(RegistryTier::User);
        registry
            .upsert(
                target("nixpkgs?ref=staging"),
                target("github:NixOS/nixpkgs"),
            )
            .unwrap();
        registry
            .upsert(alias("nixpkgs"), target("github:other/nixpkgs"))
            .unwrap();

        assert_eq!(registry.entries().len(), 1);
        assert_eq!(
            registry.lookup("nixpkgs"),
            Some(&target("github:other/nixpkgs"))
        );
    }

    #[test]
    fn test_upsert_rejects_non_alias() {
        let mut registry = Registry::new(RegistryTier::User);
        let err = registry
            .upsert(target("github:x/a"), target("github:x/b"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotAnAlias { .. }));
    }

    #[test]
    fn test_remove() {
        let mut registry = Registry::new(RegistryTier::User);
        registry.upsert(alias("a"), target("github:x/a")).unwrap();

        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_save_load_roundtrip_preserves_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("registry.toml");

        let mut registry = Registry::new(RegistryTier::User);
        registry.upsert(alias("zlib"), target("github:z/zlib")).unwrap();
        registry.upsert(alias("app"), target("github:a/app")).unwrap();
        registry.upsert(alias("chained"), target("zlib")).unwrap();
        registry.save(&path).unwrap();

        let loaded = Registry::load(RegistryTier::User, &path).unwrap();
        assert_eq!(loaded.entries(), registry.entries());
    }

    #[test]
    fn test_load_missing_is_empty() {
        let tmp = TempDir::new().unwrap();
        let registry =
            Registry::load(RegistryTier::User, &tmp.path().join("none.toml")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_rejects_non_alias_from() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("registry.toml");
        std::fs::write(
            &path,
            "version = 1\ntier = \"user\"\n\n[[entry]]\nfrom = \"github:x/a\"\nto = \"github:x/b\"\n",
        )
        .unwrap();

        assert!(Registry::load(RegistryTier::User, &path).is_err());
    }

    #[test]
    fn test_load_rejects_tier_mismatch() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("registry.toml");

        let mut registry = Registry::new(RegistryTier::User);
        registry.upsert(alias("a"), target("github:x/a")).unwrap();
        registry.save(&path).unwrap();

        assert!(Registry::load(RegistryTier::Global, &path).is_err());
        assert!(Registry::load(RegistryTier::User, &path).is_ok());
    }
}
