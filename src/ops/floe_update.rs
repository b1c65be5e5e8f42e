//! Implementation of `floe update`.

use std::path::PathBuf;

use crate::core::chain::RegistryChain;
use crate::core::reference::FlakeRef;
use crate::eval::Evaluator;
use crate::resolver::errors::ResolveError;
use crate::resolver::lock::{LockFile, LockedInput, LOCK_FILE_NAME};
use crate::resolver::resolve::{LockMode, ResolvedFlake, Resolver};
use crate::sources::Fetcher;

/// Re-resolve a path flake's inputs and overwrite its lock.
///
/// This is the only operation that modifies a lock file. Only a path
/// flake can be updated: a remote reference is already pinned by its
/// revision, so a lock for it would be meaningless.
pub fn update_lock(
    chain: &RegistryChain,
    fetcher: &dyn Fetcher,
    evaluator: &dyn Evaluator,
    reference: &FlakeRef,
) -> Result<(PathBuf, LockFile), ResolveError> {
    let FlakeRef::Path { path } = reference else {
        return Err(ResolveError::NotUpdatable {
            reference: reference.to_string(),
        });
    };

    let mut resolver = Resolver::new(chain, fetcher, evaluator);
    let resolved = resolver.resolve(reference, LockMode::ForceUpdate)?;

    // Write next to the canonicalized flake, so `floe update .` and an
    // absolute path agree on where the lock lives.
    let dir = match &resolved.flake.source.resolved_ref {
        FlakeRef::Path { path } => path.clone(),
        _ => path.clone(),
    };

    let lock = lock_from_resolved(&resolved);
    let lock_path = dir.join(LOCK_FILE_NAME);
    lock.save(&lock_path)?;
    tracing::info!(
        "wrote {} with {} pinned inputs",
        lock_path.display(),
        lock.inputs().len()
    );

    Ok((lock_path, lock))
}

/// Collect the direct-input pins, in declaration order.
fn lock_from_resolved(resolved: &ResolvedFlake) -> LockFile {
    let mut inputs = Vec::new();
    for input in &resolved.flake.metadata.inputs {
        let pinned = resolved
            .deps
            .iter()
            .find(|(name, _)| name == &input.name)
            .map(|(_, node)| node.flake.source.resolved_ref.clone())
            .or_else(|| {
                resolved
                    .non_flake_deps
                    .iter()
                    .find(|dep| dep.name == input.name)
                    .map(|dep| dep.source.resolved_ref.clone())
            });
        if let Some(reference) = pinned {
            inputs.push(LockedInput {
                name: input.name.clone(),
                reference,
            });
        }
    }
    LockFile::new(inputs)
}
