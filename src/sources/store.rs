//! The content-addressed source store.
//!
//! Fetched trees are copied under a name derived from their content hash,
//! so identical content lands at identical paths and repeated fetches of
//! unchanged sources are cheap.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::{fs, hash};

/// A content-addressed store of source trees.
#[derive(Debug, Clone)]
pub struct SourceStore {
    root: PathBuf,
}

impl SourceStore {
    pub fn new(root: PathBuf) -> Self {
        SourceStore { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy a tree into the store under its content hash.
    ///
    /// Returns the store path and the full content hash. If an entry for
    /// the hash already exists the copy is skipped.
    pub fn add_tree(&self, src: &Path, name: &str) -> Result<(PathBuf, String)> {
        let content_hash = hash::hash_tree(src)?;
        let entry_name = format!("{}-{}", &content_hash[..16], sanitize_name(name));
        let dest = self.root.join(&entry_name);

        if !dest.exists() {
            fs::ensure_dir(&self.root)?;
            // Stage into a temporary sibling and rename, so a failed copy
            // never leaves a half-populated store entry.
            let staging = tempfile::tempdir_in(&self.root)
                .context("failed to create staging directory in store")?;
            let staged = staging.path().join(&entry_name);
            fs::copy_tree(src, &staged)?;
            match std::fs::rename(&staged, &dest) {
                Ok(()) => {}
                // A concurrent invocation may have won the race; identical
                // content, so theirs is as good as ours.
                Err(_) if dest.exists() => {}
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("failed to move tree into store: {}", dest.display())
                    });
                }
            }
        }

        Ok((dest, content_hash))
    }
}

fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "source".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_add_tree_is_content_addressed() {
        let tmp = TempDir::new().unwrap();
        let store = SourceStore::new(tmp.path().join("store"));

        let src = tmp.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("file.txt"), "content").unwrap();

        let (path1, hash1) = store.add_tree(&src, "demo").unwrap();
        let (path2, hash2) = store.add_tree(&src, "demo").unwrap();

        assert_eq!(path1, path2);
        assert_eq!(hash1, hash2);
        assert!(path1.join("file.txt").exists());

        // Different content, different entry.
        std::fs::write(src.join("file.txt"), "changed").unwrap();
        let (path3, hash3) = store.add_tree(&src, "demo").unwrap();
        assert_ne!(path1, path3);
        assert_ne!(hash1, hash3);
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("repo.git"), "repo.git");
        assert_eq!(sanitize_name("a/b c"), "a-b-c");
        assert_eq!(sanitize_name(""), "source");
    }
}
