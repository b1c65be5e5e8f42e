//! Floe - a flake reference resolver and registry manager.
//!
//! This crate provides the core library functionality for Floe:
//! classifying flake references, resolving aliases through the tiered
//! registry chain, building concrete dependency graphs, and maintaining
//! registry and lock files.

pub mod core;
pub mod eval;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test utilities and mocks for Floe unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a synthetic flake universe implementing the
/// fetch and evaluation capabilities in memory.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{FlakeRef, Registry, RegistryChain, RegistryTier};
pub use eval::{Evaluator, FlakeMetadata, ManifestEvaluator};
pub use resolver::{LockFile, LockMode, ResolveError, ResolvedFlake, Resolver};
pub use sources::{DefaultFetcher, Fetcher, SourceInfo};
pub use util::context::GlobalContext;
