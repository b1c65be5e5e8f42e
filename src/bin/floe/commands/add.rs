//! `floe add` command

use anyhow::Result;

use floe::core::FlakeRef;
use floe::ops::floe_registry;
use floe::util::GlobalContext;

use crate::cli::AddArgs;

pub fn execute(args: AddArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let target = FlakeRef::parse(&args.flake_ref)?;

    floe_registry::add(&ctx, &args.alias, &target)?;
    eprintln!("    Registered {} -> {}", args.alias, target);

    Ok(())
}
