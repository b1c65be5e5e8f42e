//! CLI command implementations.

pub mod add;
pub mod completions;
pub mod deps;
pub mod info;
pub mod list;
pub mod pin;
pub mod remove;
pub mod update;

use anyhow::Result;
use serde_json::json;

use floe::core::chain::RegistryChain;
use floe::eval::ManifestEvaluator;
use floe::ops;
use floe::resolver::resolve::{Flake, NonFlakeDep};
use floe::resolver::ResolveError;
use floe::sources::{DefaultFetcher, SourceInfo};
use floe::util::GlobalContext;

/// Everything a resolving command needs: context, registry chain,
/// fetcher and evaluator.
pub(crate) struct Session {
    pub ctx: GlobalContext,
    pub chain: RegistryChain,
    pub fetcher: DefaultFetcher,
    pub evaluator: ManifestEvaluator,
}

pub(crate) fn session(overrides: &[String]) -> Result<Session> {
    let ctx = GlobalContext::new()?;
    let overrides = ops::resolve::parse_overrides(overrides)?;
    let chain = ops::resolve::load_registries(&ctx, &overrides)?;
    let fetcher = DefaultFetcher::new(&ctx);

    Ok(Session {
        ctx,
        chain,
        fetcher,
        evaluator: ManifestEvaluator,
    })
}

/// Render a resolution error through its diagnostic.
pub(crate) fn resolve_err(err: ResolveError) -> anyhow::Error {
    anyhow::anyhow!("{}", err.to_diagnostic())
}

pub(crate) fn print_source_info(source: &SourceInfo) {
    println!("URI:         {}", source.resolved_ref);
    if let Some(reference) = source.resolved_ref.reference() {
        println!("Branch:      {reference}");
    }
    if let Some(rev) = source.resolved_ref.rev() {
        println!("Revision:    {rev}");
    }
    if let Some(rev_count) = source.rev_count {
        println!("Revcount:    {rev_count}");
    }
    println!("Path:        {}", source.store_path.display());
}

pub(crate) fn print_flake_info(flake: &Flake) {
    println!("ID:          {}", flake.metadata.id);
    println!("Description: {}", flake.metadata.description);
    println!("Epoch:       {}", flake.metadata.epoch);
    print_source_info(&flake.source);
}

pub(crate) fn print_non_flake_info(dep: &NonFlakeDep) {
    println!("ID:          {}", dep.name);
    print_source_info(&dep.source);
}

pub(crate) fn source_info_json(source: &SourceInfo) -> serde_json::Map<String, serde_json::Value> {
    let mut j = serde_json::Map::new();
    j.insert("uri".to_string(), json!(source.resolved_ref.to_string()));
    if let Some(reference) = source.resolved_ref.reference() {
        j.insert("branch".to_string(), json!(reference));
    }
    if let Some(rev) = source.resolved_ref.rev() {
        j.insert("revision".to_string(), json!(rev));
    }
    if let Some(rev_count) = source.rev_count {
        j.insert("revCount".to_string(), json!(rev_count));
    }
    j.insert("path".to_string(), json!(source.store_path));
    j
}

pub(crate) fn flake_json(flake: &Flake) -> serde_json::Value {
    let mut j = serde_json::Map::new();
    j.insert("id".to_string(), json!(flake.metadata.id));
    j.insert("description".to_string(), json!(flake.metadata.description));
    j.insert("epoch".to_string(), json!(flake.metadata.epoch));
    j.extend(source_info_json(&flake.source));
    serde_json::Value::Object(j)
}

pub(crate) fn non_flake_json(dep: &NonFlakeDep) -> serde_json::Value {
    let mut j = serde_json::Map::new();
    j.insert("id".to_string(), json!(dep.name));
    j.extend(source_info_json(&dep.source));
    serde_json::Value::Object(j)
}
