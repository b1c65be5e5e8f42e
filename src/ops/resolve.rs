//! Assembling a resolution session from persisted state.

use anyhow::{Context, Result};

use crate::core::chain::RegistryChain;
use crate::core::reference::FlakeRef;
use crate::core::registry::{Registry, RegistryTier};
use crate::util::context::GlobalContext;

/// Parse `alias=flake-ref` override pairs from the command line.
pub fn parse_overrides(raw: &[String]) -> Result<Vec<(String, FlakeRef)>> {
    raw.iter()
        .map(|spec| {
            let (alias, target) = spec.split_once('=').with_context(|| {
                format!("invalid override `{spec}`: expected `alias=flake-ref`")
            })?;
            let target = FlakeRef::parse(target)
                .with_context(|| format!("invalid override target in `{spec}`"))?;
            Ok((alias.to_string(), target))
        })
        .collect()
}

/// Load the persisted registry tiers and assemble the lookup chain.
///
/// Flag overrides exist only in the returned chain; they are never
/// persisted anywhere.
pub fn load_registries(
    ctx: &GlobalContext,
    overrides: &[(String, FlakeRef)],
) -> Result<RegistryChain> {
    let mut flag = Registry::new(RegistryTier::Flag);
    for (alias, target) in overrides {
        flag.upsert(FlakeRef::indirect(alias)?, target.clone())?;
    }

    let user = Registry::load(RegistryTier::User, &ctx.user_registry_path())?;
    let global = Registry::load(RegistryTier::Global, &ctx.global_registry_path())?;

    Ok(RegistryChain::new(flag, user, global))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_overrides() {
        let parsed = parse_overrides(&["pkgs=github:x/pkgs".to_string()]).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].0, "pkgs");
        assert_eq!(parsed[0].1, FlakeRef::parse("github:x/pkgs").unwrap());

        assert!(parse_overrides(&["missing-equals".to_string()]).is_err());
        assert!(parse_overrides(&["pkgs=not a ref!".to_string()]).is_err());
    }

    #[test]
    fn test_load_registries_with_overrides() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_home(tmp.path().to_path_buf()).unwrap();

        let mut user = Registry::new(RegistryTier::User);
        user.upsert(
            FlakeRef::indirect("pkgs").unwrap(),
            FlakeRef::parse("github:user/pkgs").unwrap(),
        )
        .unwrap();
        user.save(&ctx.user_registry_path()).unwrap();

        let overrides =
            parse_overrides(&["pkgs=github:flag/pkgs".to_string()]).unwrap();
        let chain = load_registries(&ctx, &overrides).unwrap();

        // The flag tier wins over the persisted user entry.
        assert_eq!(
            chain.substitute_once(&FlakeRef::indirect("pkgs").unwrap()),
            FlakeRef::parse("github:flag/pkgs").unwrap()
        );
    }
}
