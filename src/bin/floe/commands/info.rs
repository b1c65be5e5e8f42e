//! `floe info` command

use anyhow::Result;

use floe::core::FlakeRef;
use floe::resolver::Resolver;

use crate::cli::InfoArgs;

pub fn execute(args: InfoArgs, overrides: &[String]) -> Result<()> {
    let session = super::session(overrides)?;
    let reference = FlakeRef::parse(&args.flake_ref)?;

    let mut resolver = Resolver::new(&session.chain, &session.fetcher, &session.evaluator);
    let flake = resolver.get_flake(&reference).map_err(super::resolve_err)?;

    if args.json {
        println!("{}", super::flake_json(&flake));
    } else {
        super::print_flake_info(&flake);
    }

    Ok(())
}
