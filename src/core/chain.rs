//! The three-tier registry lookup chain.

use crate::core::reference::FlakeRef;
use crate::core::registry::{Registry, RegistryTier};

/// The registry tiers in fixed priority order: flag overrides, then the
/// user registry, then the global registry.
///
/// The chain is an immutable snapshot for the duration of one operation;
/// flag overrides are rebuilt per invocation and never persisted.
#[derive(Debug, Clone)]
pub struct RegistryChain {
    flag: Registry,
    user: Registry,
    global: Registry,
}

impl RegistryChain {
    pub fn new(flag: Registry, user: Registry, global: Registry) -> Self {
        debug_assert_eq!(flag.tier(), RegistryTier::Flag);
        debug_assert_eq!(user.tier(), RegistryTier::User);
        debug_assert_eq!(global.tier(), RegistryTier::Global);
        RegistryChain { flag, user, global }
    }

    /// The tiers in priority order.
    pub fn tiers(&self) -> [&Registry; 3] {
        [&self.flag, &self.user, &self.global]
    }

    pub fn user(&self) -> &Registry {
        &self.user
    }

    pub fn global(&self) -> &Registry {
        &self.global
    }

    /// Apply one alias substitution step.
    ///
    /// Consults the tiers in priority order and returns the first mapped
    /// target, with the alias's own `ref`/`rev` decorations overlaid.
    /// Non-alias references and unmapped aliases are returned unchanged;
    /// an unchanged result means no further substitution is possible.
    pub fn substitute_once(&self, reference: &FlakeRef) -> FlakeRef {
        let FlakeRef::Indirect {
            alias,
            reference: track,
            rev,
        } = reference
        else {
            return reference.clone();
        };

        for registry in self.tiers() {
            if let Some(target) = registry.lookup(alias) {
                tracing::debug!(
                    "substituting `{}` -> `{}` ({} registry)",
                    reference,
                    target,
                    registry.tier()
                );
                return target
                    .clone()
                    .apply_decorations(track.as_deref(), rev.as_deref());
            }
        }

        reference.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(entries: &[(RegistryTier, &str, &str)]) -> RegistryChain {
        let mut flag = Registry::new(RegistryTier::Flag);
        let mut user = Registry::new(RegistryTier::User);
        let mut global = Registry::new(RegistryTier::Global);
        for (tier, from, to) in entries {
            let registry = match tier {
                RegistryTier::Flag => &mut flag,
                RegistryTier::User => &mut user,
                RegistryTier::Global => &mut global,
            };
            registry
                .upsert(
                    FlakeRef::indirect(from).unwrap(),
                    FlakeRef::parse(to).unwrap(),
                )
                .unwrap();
        }
        RegistryChain::new(flag, user, global)
    }

    fn parse(text: &str) -> FlakeRef {
        FlakeRef::parse(text).unwrap()
    }

    #[test]
    fn test_unmapped_alias_is_fixed_point() {
        let chain = chain(&[]);
        let reference = parse("nixpkgs");
        assert_eq!(chain.substitute_once(&reference), reference);
    }

    #[test]
    fn test_non_alias_passes_through() {
        let chain = chain(&[(RegistryTier::User, "repo", "github:x/repo")]);
        let path = parse("./checkout");
        assert_eq!(chain.substitute_once(&path), path);
        let concrete = parse("github:a/b");
        assert_eq!(chain.substitute_once(&concrete), concrete);
    }

    #[test]
    fn test_priority_order() {
        let chain = chain(&[
            (RegistryTier::Global, "pkgs", "github:global/pkgs"),
            (RegistryTier::User, "pkgs", "github:user/pkgs"),
            (RegistryTier::Flag, "pkgs", "github:flag/pkgs"),
        ]);
        assert_eq!(chain.substitute_once(&parse("pkgs")), parse("github:flag/pkgs"));

        let chain = chain_without_flag();
        assert_eq!(chain.substitute_once(&parse("pkgs")), parse("github:user/pkgs"));
    }

    fn chain_without_flag() -> RegistryChain {
        chain(&[
            (RegistryTier::Global, "pkgs", "github:global/pkgs"),
            (RegistryTier::User, "pkgs", "github:user/pkgs"),
        ])
    }

    #[test]
    fn test_flag_tier_overrides_mid_chain() {
        // `a` resolves through the global tier to another alias `b`; a
        // flag override for `b` must win when the next step re-enters the
        // chain.
        let chain = chain(&[
            (RegistryTier::Global, "a", "b"),
            (RegistryTier::Global, "b", "github:global/b"),
            (RegistryTier::Flag, "b", "github:flag/b"),
        ]);

        let step1 = chain.substitute_once(&parse("a"));
        assert_eq!(step1, parse("b"));
        let step2 = chain.substitute_once(&step1);
        assert_eq!(step2, parse("github:flag/b"));
    }

    #[test]
    fn test_decorations_carry_onto_target() {
        let chain = chain(&[(RegistryTier::User, "pkgs", "github:x/pkgs")]);
        let decorated = parse("pkgs?ref=staging");
        assert_eq!(
            chain.substitute_once(&decorated),
            parse("github:x/pkgs?ref=staging")
        );
    }

    #[test]
    fn test_decorations_do_not_override_target_pin() {
        let chain = chain(&[(RegistryTier::User, "pkgs", "github:x/pkgs?ref=release")]);
        let decorated = parse("pkgs?ref=staging");
        assert_eq!(
            chain.substitute_once(&decorated),
            parse("github:x/pkgs?ref=release")
        );
    }
}
