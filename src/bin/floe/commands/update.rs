//! `floe update` command

use anyhow::Result;

use floe::core::FlakeRef;
use floe::ops::floe_update::update_lock;

use crate::cli::UpdateArgs;

pub fn execute(args: UpdateArgs, overrides: &[String]) -> Result<()> {
    let session = super::session(overrides)?;
    let reference = FlakeRef::parse(&args.flake_ref)?;

    let (lock_path, lock) = update_lock(
        &session.chain,
        &session.fetcher,
        &session.evaluator,
        &reference,
    )
    .map_err(super::resolve_err)?;

    eprintln!(
        "    Updated {} ({} inputs pinned)",
        lock_path.display(),
        lock.inputs().len()
    );

    Ok(())
}
