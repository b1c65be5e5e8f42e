//! Implementation of `floe pin`.

use anyhow::Result;

use crate::core::chain::RegistryChain;
use crate::core::reference::FlakeRef;
use crate::core::registry::{Registry, RegistryTier};
use crate::eval::Evaluator;
use crate::resolver::errors::ResolveError;
use crate::resolver::resolve::Resolver;
use crate::sources::Fetcher;
use crate::util::context::GlobalContext;
use crate::util::fs::FileLock;

/// Pin an alias in the user registry to its fully resolved target.
///
/// The alias is looked up in the user registry first; when only the
/// global registry maps it, the concrete result is promoted into the user
/// registry as a new entry. The flag tier is ephemeral and never
/// consulted or written here.
pub fn pin(
    ctx: &GlobalContext,
    chain: &RegistryChain,
    fetcher: &dyn Fetcher,
    evaluator: &dyn Evaluator,
    alias: &str,
) -> Result<FlakeRef> {
    // Exclusive lock spanning read, resolve and persist: a concurrent
    // add/remove/pin must not be lost.
    let _guard = FileLock::exclusive(&ctx.user_registry_lock_path())?;

    let registry_path = ctx.user_registry_path();
    let mut user = Registry::load(RegistryTier::User, &registry_path)?;

    let target = user
        .lookup(alias)
        .or_else(|| chain.global().lookup(alias))
        .cloned();
    let Some(target) = target else {
        return Err(ResolveError::AliasNotFound {
            alias: alias.to_string(),
        }
        .into());
    };

    let mut resolver = Resolver::new(chain, fetcher, evaluator);
    let flake = resolver.get_flake(&target)?;
    let pinned = flake.source.resolved_ref.clone();

    tracing::info!("pinning `{alias}` to `{pinned}`");
    user.upsert(FlakeRef::indirect(alias)?, pinned.clone())?;
    user.save(&registry_path)?;

    Ok(pinned)
}
