//! Global context for Floe operations.
//!
//! Provides centralized access to the directories Floe reads and writes:
//! the user and global registry files, the content-addressed source store,
//! and the git checkout cache.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use directories::ProjectDirs;

/// Environment variable overriding the Floe home directory. Used by tests
/// and by users who want fully self-contained state.
pub const HOME_ENV: &str = "FLOE_HOME";

/// Project directories for Floe
static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("dev", "floe", "floe"));

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global Floe data (registries, store, caches)
    home: PathBuf,

    /// Whether to use verbose output
    verbose: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        let home = if let Some(home) = std::env::var_os(HOME_ENV) {
            PathBuf::from(home)
        } else if let Some(dirs) = PROJECT_DIRS.as_ref() {
            dirs.data_dir().to_path_buf()
        } else {
            // Fallback to ~/.floe
            std::env::var_os("HOME")
                .map(|h| PathBuf::from(h).join(".floe"))
                .unwrap_or_else(|| PathBuf::from(".floe"))
        };

        Ok(GlobalContext {
            cwd,
            home,
            verbose: false,
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Create a GlobalContext rooted at an explicit home directory.
    pub fn with_home(home: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.home = home;
        Ok(ctx)
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the Floe home directory.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Path of the user registry file.
    pub fn user_registry_path(&self) -> PathBuf {
        self.home.join("registry.toml")
    }

    /// Path of the lock file guarding user-registry read-modify-write.
    pub fn user_registry_lock_path(&self) -> PathBuf {
        self.home.join(".registry.lock")
    }

    /// Path of the global registry file.
    pub fn global_registry_path(&self) -> PathBuf {
        self.home.join("global-registry.toml")
    }

    /// The content-addressed store for fetched source trees.
    pub fn store_dir(&self) -> PathBuf {
        self.home.join("store")
    }

    /// The cache directory for git checkouts.
    pub fn git_cache_dir(&self) -> PathBuf {
        self.home.join("cache").join("git")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_paths_hang_off_home() {
        let ctx = GlobalContext::with_home(PathBuf::from("/tmp/floe-test")).unwrap();
        assert_eq!(
            ctx.user_registry_path(),
            PathBuf::from("/tmp/floe-test/registry.toml")
        );
        assert_eq!(
            ctx.global_registry_path(),
            PathBuf::from("/tmp/floe-test/global-registry.toml")
        );
        assert!(ctx.store_dir().starts_with(ctx.home()));
        assert!(ctx.git_cache_dir().starts_with(ctx.home()));
    }

    #[test]
    fn test_with_cwd() {
        let ctx = GlobalContext::with_cwd(PathBuf::from("/srv/work")).unwrap();
        assert_eq!(ctx.cwd(), Path::new("/srv/work"));
    }
}
