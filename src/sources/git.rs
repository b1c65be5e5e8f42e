//! Git source - flakes fetched from git repositories.

use std::path::{Path, PathBuf};

use git2::{Repository, ResetType};
use url::Url;

use crate::core::reference::{ConcreteRef, FlakeRef, Location};
use crate::sources::store::SourceStore;
use crate::sources::{FetchError, SourceInfo};
use crate::util::hash::sha256_str;

/// Fetch a git repository at the given branch/tag or revision.
///
/// Maintains one cached checkout per remote under `cache_dir`, updates it,
/// resolves the requested reference to a precise commit and copies the
/// tree into the store. The resolved reference carries the full commit
/// hash and a revision count.
pub fn fetch(
    store: &SourceStore,
    cache_dir: &Path,
    url: &Url,
    reference: Option<&str>,
    rev: Option<&str>,
) -> Result<SourceInfo, FetchError> {
    let git_err = |source: git2::Error| FetchError::Git {
        reference: url.to_string(),
        source,
    };

    let checkout_path = checkout_path_for(cache_dir, url);
    let repo = if checkout_path.exists() {
        let repo = Repository::open(&checkout_path).map_err(git_err)?;
        update(&repo, url)?;
        repo
    } else {
        clone(url, &checkout_path)?
    };

    let (commit_id, rev_count) = {
        let commit = resolve_commit(&repo, reference, rev).map_err(git_err)?;
        repo.reset(commit.as_object(), ResetType::Hard, None)
            .map_err(git_err)?;

        let mut walk = repo.revwalk().map_err(git_err)?;
        walk.push(commit.id()).map_err(git_err)?;
        (commit.id().to_string(), walk.count() as u64)
    };

    let name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|s| s.trim_end_matches(".git").to_string())
        .unwrap_or_else(|| "git".to_string());

    let (store_path, content_hash) =
        store
            .add_tree(&checkout_path, &name)
            .map_err(|e| FetchError::Store {
                reference: url.to_string(),
                message: format!("{e:#}"),
            })?;

    Ok(SourceInfo {
        resolved_ref: FlakeRef::Concrete(ConcreteRef {
            location: Location::Git { url: url.clone() },
            reference: reference.map(str::to_string),
            rev: Some(commit_id),
        }),
        rev_count: Some(rev_count),
        store_path,
        content_hash,
    })
}

fn clone(url: &Url, checkout_path: &Path) -> Result<Repository, FetchError> {
    tracing::info!("cloning {url}");

    if let Some(parent) = checkout_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| FetchError::Io {
            reference: url.to_string(),
            source: e,
        })?;
    }

    Repository::clone(url.as_str(), checkout_path).map_err(|source| FetchError::Git {
        reference: url.to_string(),
        source,
    })
}

fn update(repo: &Repository, url: &Url) -> Result<(), FetchError> {
    tracing::info!("updating {url}");

    let mut remote = repo.find_remote("origin").map_err(|source| FetchError::Git {
        reference: url.to_string(),
        source,
    })?;
    remote
        .fetch(
            &[
                "+refs/heads/*:refs/heads/*",
                "+refs/tags/*:refs/tags/*",
            ],
            None,
            None,
        )
        .map_err(|source| FetchError::Git {
            reference: url.to_string(),
            source,
        })?;

    Ok(())
}

fn resolve_commit<'r>(
    repo: &'r Repository,
    reference: Option<&str>,
    rev: Option<&str>,
) -> Result<git2::Commit<'r>, git2::Error> {
    if let Some(rev) = rev {
        let oid = git2::Oid::from_str(rev)?;
        return repo.find_commit(oid);
    }

    if let Some(name) = reference {
        // A ref names a branch first, a tag second.
        if let Ok(branch) = repo.find_branch(name, git2::BranchType::Local) {
            return branch.get().peel_to_commit();
        }
        let tag = repo.find_reference(&format!("refs/tags/{name}"))?;
        return tag.peel_to_commit();
    }

    repo.head()?.peel_to_commit()
}

fn checkout_path_for(cache_dir: &Path, url: &Url) -> PathBuf {
    let dir_name = format!(
        "{}-{}",
        sanitize_url_for_path(url),
        &sha256_str(url.as_str())[..8]
    );
    cache_dir.join(dir_name)
}

fn sanitize_url_for_path(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|s| s.trim_end_matches(".git"))
        .filter(|s| !s.is_empty())
        .unwrap_or("repo")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_path_is_stable_per_remote() {
        let cache = Path::new("/cache/git");
        let a = Url::parse("https://example.org/team/repo.git").unwrap();
        let b = Url::parse("https://example.org/other/repo.git").unwrap();

        assert_eq!(checkout_path_for(cache, &a), checkout_path_for(cache, &a));
        assert_ne!(checkout_path_for(cache, &a), checkout_path_for(cache, &b));
        assert!(checkout_path_for(cache, &a)
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("repo-"));
    }
}
