//! GitHub source - flakes fetched as tarballs through the github api.
//!
//! Cheaper than a full git clone: one api call resolves the tracked ref to
//! a precise commit, a second downloads the tarball at that commit.

use url::Url;

use crate::core::reference::{ConcreteRef, FlakeRef, Location};
use crate::sources::store::SourceStore;
use crate::sources::{tarball, FetchError, SourceInfo};

/// Fetch a github repository at the given branch/tag or revision.
pub fn fetch(
    store: &SourceStore,
    owner: &str,
    repo: &str,
    reference: Option<&str>,
    rev: Option<&str>,
) -> Result<SourceInfo, FetchError> {
    let display = format!("github:{owner}/{repo}");

    let commit = match rev {
        Some(rev) => rev.to_string(),
        None => resolve_commit(owner, repo, reference)?,
    };

    let tarball_url = format!("https://api.github.com/repos/{owner}/{repo}/tarball/{commit}");
    let parsed_url = Url::parse(&tarball_url).map_err(|_| FetchError::NotFound {
        reference: display.clone(),
    })?;

    let staging = tempfile::tempdir().map_err(|e| FetchError::Io {
        reference: display.clone(),
        source: e,
    })?;

    tarball::download_and_unpack(&tarball_url, staging.path())?;
    let root = tarball::unpacked_root(staging.path(), &parsed_url)?;

    let (store_path, content_hash) =
        store.add_tree(&root, repo).map_err(|e| FetchError::Store {
            reference: display.clone(),
            message: format!("{e:#}"),
        })?;

    Ok(SourceInfo {
        resolved_ref: FlakeRef::Concrete(ConcreteRef {
            location: Location::GitHub {
                owner: owner.to_string(),
                repo: repo.to_string(),
            },
            reference: reference.map(str::to_string),
            rev: Some(commit),
        }),
        rev_count: None,
        store_path,
        content_hash,
    })
}

/// Resolve a branch/tag (or the default branch) to a full commit hash via
/// the github commits api.
fn resolve_commit(owner: &str, repo: &str, reference: Option<&str>) -> Result<String, FetchError> {
    let commitish = reference.unwrap_or("HEAD");
    let url = format!("https://api.github.com/repos/{owner}/{repo}/commits/{commitish}");

    let client = tarball::http_client(&url)?;
    let response = client
        .get(&url)
        .header(reqwest::header::ACCEPT, "application/vnd.github.sha")
        .send()
        .map_err(|source| FetchError::Http {
            url: url.clone(),
            source,
        })?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(FetchError::NotFound {
            reference: format!("github:{owner}/{repo} (commit-ish `{commitish}`)"),
        });
    }
    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            url,
            status: status.as_u16(),
        });
    }

    let sha = response
        .text()
        .map_err(|source| FetchError::Http {
            url: url.clone(),
            source,
        })?
        .trim()
        .to_string();

    if sha.len() != 40 || !sha.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(FetchError::NotFound {
            reference: format!("github:{owner}/{repo} (commit-ish `{commitish}`)"),
        });
    }

    tracing::debug!("resolved github:{owner}/{repo} `{commitish}` to {sha}");
    Ok(sha)
}
