//! `floe list` command

use anyhow::Result;

pub fn execute(overrides: &[String]) -> Result<()> {
    let session = super::session(overrides)?;

    for registry in session.chain.tiers() {
        for entry in registry.entries() {
            println!("{} {} {}", entry.from, registry.tier(), entry.to);
        }
    }

    Ok(())
}
