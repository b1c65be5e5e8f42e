//! Resolution error types and diagnostics.

use thiserror::Error;

use crate::core::reference::RefParseError;
use crate::eval::EvalError;
use crate::resolver::lock::LockError;
use crate::sources::FetchError;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error during flake resolution.
///
/// Every resolution failure aborts the whole traversal; a dependency graph
/// with missing nodes would be unsafe to build against.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("alias cycle detected while resolving `{reference}`")]
    CyclicAlias {
        reference: String,
        chain: Vec<String>,
    },

    #[error("flake dependency cycle detected at `{reference}`")]
    CyclicFlake { reference: String },

    #[error("the flake alias `{alias}` does not exist in the user or global registry")]
    AliasNotFound { alias: String },

    #[error("cannot update lock of flake `{reference}`: not a local path")]
    NotUpdatable { reference: String },

    #[error(transparent)]
    Parse(#[from] RefParseError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl ResolveError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::CyclicAlias { reference, chain } => {
                Diagnostic::error(format!("alias cycle detected while resolving `{reference}`"))
                    .with_context(format!("cycle: {}", chain.join(" -> ")))
                    .with_suggestion("Remove one of the registry entries forming the cycle")
            }

            ResolveError::CyclicFlake { reference } => {
                Diagnostic::error("flake dependency cycle detected")
                    .with_context(format!("`{reference}` depends on itself through its inputs"))
                    .with_suggestion("Break the cycle by removing or restructuring inputs")
            }

            ResolveError::AliasNotFound { alias } => {
                Diagnostic::error(format!(
                    "the flake alias `{alias}` does not exist in the user or global registry"
                ))
                .with_suggestion(suggestions::UNKNOWN_ALIAS)
                .with_suggestion(suggestions::ADD_ALIAS)
            }

            ResolveError::NotUpdatable { reference } => {
                Diagnostic::error(format!("cannot update lock of flake `{reference}`"))
                    .with_suggestion(suggestions::NOT_UPDATABLE)
            }

            ResolveError::Fetch(e) => {
                Diagnostic::error(format!("{e}")).with_suggestion(suggestions::FETCH_FAILED)
            }

            ResolveError::Parse(e) => Diagnostic::error(format!("{e}")),
            ResolveError::Lock(e) => Diagnostic::error(format!("{e}")),
            ResolveError::Eval(e) => Diagnostic::error(format!("{e}")),
        }
    }
}
