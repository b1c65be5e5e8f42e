//! Path source - flakes in local directories.

use std::path::Path;

use crate::core::reference::FlakeRef;
use crate::sources::store::SourceStore;
use crate::sources::{FetchError, SourceInfo};

/// Fetch a local directory into the store.
///
/// The resolved reference is the canonicalized path, so `./app` and
/// `/srv/app` resolve to one identity. Local checkouts are mutable and
/// carry no revision.
pub fn fetch(store: &SourceStore, path: &Path) -> Result<SourceInfo, FetchError> {
    if !path.exists() {
        return Err(FetchError::MissingPath {
            path: path.to_path_buf(),
        });
    }

    let canonical = path.canonicalize().map_err(|e| FetchError::Io {
        reference: path.display().to_string(),
        source: e,
    })?;

    let name = canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "flake".to_string());

    let (store_path, content_hash) =
        store
            .add_tree(&canonical, &name)
            .map_err(|e| FetchError::Store {
                reference: canonical.display().to_string(),
                message: format!("{e:#}"),
            })?;

    Ok(SourceInfo {
        resolved_ref: FlakeRef::Path { path: canonical },
        rev_count: None,
        store_path,
        content_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fetch_canonicalizes_identity() {
        let tmp = TempDir::new().unwrap();
        let store = SourceStore::new(tmp.path().join("store"));

        let flake_dir = tmp.path().join("flakes").join("app");
        std::fs::create_dir_all(&flake_dir).unwrap();
        std::fs::write(flake_dir.join("Floe.toml"), "[flake]\n").unwrap();

        let direct = fetch(&store, &flake_dir).unwrap();
        let dotted = fetch(&store, &tmp.path().join("flakes/./app")).unwrap();

        assert_eq!(direct.resolved_ref, dotted.resolved_ref);
        assert_eq!(direct.store_path, dotted.store_path);
        assert!(direct.resolved_ref.is_path());
        assert_eq!(direct.rev_count, None);
        assert!(direct.store_path.join("Floe.toml").exists());
    }
}
