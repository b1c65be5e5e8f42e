//! `floe remove` command

use anyhow::Result;

use floe::ops::floe_registry;
use floe::util::GlobalContext;

use crate::cli::RemoveArgs;

pub fn execute(args: RemoveArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;

    floe_registry::remove(&ctx, &args.alias)?;
    eprintln!("    Removed {}", args.alias);

    Ok(())
}
