//! Core data structures for Floe.
//!
//! This module contains the foundational types used throughout Floe:
//! - Flake references and their classification grammar
//! - Per-tier alias registries
//! - The three-tier registry lookup chain

pub mod chain;
pub mod reference;
pub mod registry;

pub use chain::RegistryChain;
pub use reference::{ConcreteRef, FlakeRef, Location, RefParseError};
pub use registry::{Registry, RegistryEntry, RegistryError, RegistryTier};
