//! Tarball source - flakes fetched from archive urls.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use url::Url;

use crate::core::reference::{ConcreteRef, FlakeRef, Location};
use crate::sources::store::SourceStore;
use crate::sources::{FetchError, SourceInfo};

/// Fetch a plain tarball url into the store.
///
/// Tarballs carry no revision; the content hash is the identity.
pub fn fetch(store: &SourceStore, url: &Url) -> Result<SourceInfo, FetchError> {
    let staging = tempfile::tempdir().map_err(|e| FetchError::Io {
        reference: url.to_string(),
        source: e,
    })?;

    download_and_unpack(url.as_str(), staging.path())?;
    let root = unpacked_root(staging.path(), url)?;

    let name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|s| {
            s.trim_end_matches(".tar.gz")
                .trim_end_matches(".tgz")
                .trim_end_matches(".tar")
                .to_string()
        })
        .unwrap_or_else(|| "tarball".to_string());

    let (store_path, content_hash) =
        store.add_tree(&root, &name).map_err(|e| FetchError::Store {
            reference: url.to_string(),
            message: format!("{e:#}"),
        })?;

    Ok(SourceInfo {
        resolved_ref: FlakeRef::Concrete(ConcreteRef {
            location: Location::Tarball { url: url.clone() },
            reference: None,
            rev: None,
        }),
        rev_count: None,
        store_path,
        content_hash,
    })
}

/// Download an archive and unpack it into `dest`.
pub(crate) fn download_and_unpack(url: &str, dest: &Path) -> Result<(), FetchError> {
    tracing::info!("downloading {url}");

    let client = http_client(url)?;
    let response = client
        .get(url)
        .send()
        .map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(FetchError::NotFound {
            reference: url.to_string(),
        });
    }
    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().map_err(|source| FetchError::Http {
        url: url.to_string(),
        source,
    })?;

    unpack(url, bytes.as_ref(), dest)
}

pub(crate) fn http_client(url: &str) -> Result<reqwest::blocking::Client, FetchError> {
    reqwest::blocking::Client::builder()
        .user_agent(concat!("floe/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(120))
        .build()
        .map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })
}

fn unpack(url: &str, bytes: &[u8], dest: &Path) -> Result<(), FetchError> {
    let unpack_err = |e: std::io::Error| FetchError::Unpack {
        url: url.to_string(),
        message: e.to_string(),
    };

    // Sniff gzip rather than trusting the extension; github tarball urls
    // carry no extension at all.
    let gzipped = bytes.starts_with(&[0x1f, 0x8b]);
    if gzipped {
        let reader: Box<dyn Read> = Box::new(GzDecoder::new(bytes));
        tar::Archive::new(reader).unpack(dest).map_err(unpack_err)
    } else {
        tar::Archive::new(bytes).unpack(dest).map_err(unpack_err)
    }
}

/// Find the tree root inside an unpacked archive: the single top-level
/// directory when there is exactly one, else the unpack directory itself.
pub(crate) fn unpacked_root(dest: &Path, url: &Url) -> Result<PathBuf, FetchError> {
    let entries: Vec<_> = std::fs::read_dir(dest)
        .map_err(|e| FetchError::Io {
            reference: url.to_string(),
            source: e,
        })?
        .filter_map(|e| e.ok())
        .collect();

    if entries.len() == 1 && entries[0].path().is_dir() {
        Ok(entries[0].path())
    } else {
        Ok(dest.to_path_buf())
    }
}
