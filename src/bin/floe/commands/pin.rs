//! `floe pin` command

use anyhow::Result;

use floe::ops::floe_pin;

use crate::cli::PinArgs;

pub fn execute(args: PinArgs, overrides: &[String]) -> Result<()> {
    let session = super::session(overrides)?;

    let pinned = floe_pin::pin(
        &session.ctx,
        &session.chain,
        &session.fetcher,
        &session.evaluator,
        &args.alias,
    )?;
    eprintln!("    Pinned {} -> {}", args.alias, pinned);

    Ok(())
}
