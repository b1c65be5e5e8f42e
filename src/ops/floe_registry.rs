//! Implementation of `floe add` and `floe remove`.

use anyhow::Result;

use crate::core::reference::FlakeRef;
use crate::core::registry::{Registry, RegistryTier};
use crate::resolver::errors::ResolveError;
use crate::util::context::GlobalContext;
use crate::util::fs::FileLock;

/// Upsert an alias mapping in the user registry.
pub fn add(ctx: &GlobalContext, alias: &str, target: &FlakeRef) -> Result<()> {
    let _guard = FileLock::exclusive(&ctx.user_registry_lock_path())?;

    let path = ctx.user_registry_path();
    let mut user = Registry::load(RegistryTier::User, &path)?;
    user.upsert(FlakeRef::indirect(alias)?, target.clone())?;
    user.save(&path)?;

    tracing::info!("registered `{alias}` -> `{target}`");
    Ok(())
}

/// Remove an alias from the user registry. Removing an absent alias is an
/// error, not a no-op.
pub fn remove(ctx: &GlobalContext, alias: &str) -> Result<()> {
    let _guard = FileLock::exclusive(&ctx.user_registry_lock_path())?;

    let path = ctx.user_registry_path();
    let mut user = Registry::load(RegistryTier::User, &path)?;
    if !user.remove(alias) {
        return Err(ResolveError::AliasNotFound {
            alias: alias.to_string(),
        }
        .into());
    }
    user.save(&path)?;

    tracing::info!("removed `{alias}`");
    Ok(())
}
