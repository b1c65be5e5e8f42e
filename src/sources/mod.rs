//! Flake source fetching - turning concrete references into store trees.
//!
//! The fetcher is the only component that touches the network or clones
//! repositories. Everything above it consumes the `Fetcher` trait, so
//! resolution logic can be tested against mock sources.

pub mod git;
pub mod github;
pub mod path;
pub mod store;
pub mod tarball;

use std::path::PathBuf;

use thiserror::Error;

use crate::core::reference::{FlakeRef, Location};
use crate::util::context::GlobalContext;

pub use store::SourceStore;

/// Error fetching a flake source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("path does not exist: {path}")]
    MissingPath { path: PathBuf },

    #[error("cannot fetch unresolved alias `{reference}`: it is not mapped by any registry")]
    UnresolvedAlias { reference: String },

    #[error("source not found: `{reference}`")]
    NotFound { reference: String },

    #[error("git operation failed for `{reference}`")]
    Git {
        reference: String,
        #[source]
        source: git2::Error,
    },

    #[error("download failed for `{url}`")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server returned status {status} for `{url}`")]
    HttpStatus { url: String, status: u16 },

    #[error("failed to unpack archive from `{url}`: {message}")]
    Unpack { url: String, message: String },

    #[error("i/o error while fetching `{reference}`")]
    Io {
        reference: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to store fetched tree for `{reference}`: {message}")]
    Store { reference: String, message: String },
}

/// The result of fetching one concrete reference. Immutable once produced.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    /// The fully resolved reference, with `ref`/`rev` filled in from the
    /// fetched object. This is the canonical identity used for
    /// deduplication and cycle detection.
    pub resolved_ref: FlakeRef,

    /// Number of commits reachable from the resolved revision, when the
    /// backing source can tell.
    pub rev_count: Option<u64>,

    /// Location of the fetched tree in the content-addressed store.
    pub store_path: PathBuf,

    /// Content hash of the stored tree.
    pub content_hash: String,
}

/// A source of flake trees.
///
/// Must be idempotent: fetching the same concrete reference twice yields
/// the same result, and is safe to call once per distinct identity.
pub trait Fetcher {
    fn fetch(&self, reference: &FlakeRef) -> Result<SourceInfo, FetchError>;
}

/// The standard fetcher, dispatching on the reference kind.
pub struct DefaultFetcher {
    store: SourceStore,
    git_cache: PathBuf,
}

impl DefaultFetcher {
    pub fn new(ctx: &GlobalContext) -> Self {
        DefaultFetcher {
            store: SourceStore::new(ctx.store_dir()),
            git_cache: ctx.git_cache_dir(),
        }
    }

    /// Construct a fetcher over explicit directories.
    pub fn with_dirs(store_dir: PathBuf, git_cache: PathBuf) -> Self {
        DefaultFetcher {
            store: SourceStore::new(store_dir),
            git_cache,
        }
    }
}

impl Fetcher for DefaultFetcher {
    fn fetch(&self, reference: &FlakeRef) -> Result<SourceInfo, FetchError> {
        tracing::debug!("fetching {reference}");
        match reference {
            FlakeRef::Path { path } => path::fetch(&self.store, path),
            FlakeRef::Concrete(concrete) => match &concrete.location {
                Location::GitHub { owner, repo } => github::fetch(
                    &self.store,
                    owner,
                    repo,
                    concrete.reference.as_deref(),
                    concrete.rev.as_deref(),
                ),
                Location::Git { url } => git::fetch(
                    &self.store,
                    &self.git_cache,
                    url,
                    concrete.reference.as_deref(),
                    concrete.rev.as_deref(),
                ),
                Location::Tarball { url } => tarball::fetch(&self.store, url),
            },
            FlakeRef::Indirect { .. } => Err(FetchError::UnresolvedAlias {
                reference: reference.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fetch_rejects_indirect() {
        let tmp = TempDir::new().unwrap();
        let fetcher =
            DefaultFetcher::with_dirs(tmp.path().join("store"), tmp.path().join("git"));

        let err = fetcher
            .fetch(&FlakeRef::indirect("nixpkgs").unwrap())
            .unwrap_err();
        assert!(matches!(err, FetchError::UnresolvedAlias { .. }));
    }

    #[test]
    fn test_fetch_missing_path() {
        let tmp = TempDir::new().unwrap();
        let fetcher =
            DefaultFetcher::with_dirs(tmp.path().join("store"), tmp.path().join("git"));

        let err = fetcher
            .fetch(&FlakeRef::Path {
                path: tmp.path().join("nope"),
            })
            .unwrap_err();
        assert!(matches!(err, FetchError::MissingPath { .. }));
    }
}
