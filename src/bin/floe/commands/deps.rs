//! `floe deps` command

use anyhow::Result;

use floe::core::FlakeRef;
use floe::resolver::{LockMode, Resolver};

use crate::cli::DepsArgs;

pub fn execute(args: DepsArgs, overrides: &[String]) -> Result<()> {
    let session = super::session(overrides)?;
    let reference = FlakeRef::parse(&args.flake_ref)?;

    let mut resolver = Resolver::new(&session.chain, &session.fetcher, &session.evaluator);
    let resolved = resolver
        .resolve(&reference, LockMode::ReadOnly)
        .map_err(super::resolve_err)?;

    if args.json {
        let mut deps = Vec::new();
        for node in resolved.walk() {
            for dep in &node.non_flake_deps {
                deps.push(super::non_flake_json(dep));
            }
            for (_, dep) in &node.deps {
                deps.push(super::flake_json(&dep.flake));
            }
        }
        println!("{}", serde_json::Value::Array(deps));
    } else {
        for node in resolved.walk() {
            for dep in &node.non_flake_deps {
                super::print_non_flake_info(dep);
            }
            for (_, dep) in &node.deps {
                super::print_flake_info(&dep.flake);
            }
        }
    }

    Ok(())
}
