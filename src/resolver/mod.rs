//! Flake graph resolution.
//!
//! Turns a single flake reference into a fully concrete dependency tree:
//! aliases are substituted through the registry chain to a fixed point,
//! concrete references are fetched and evaluated, and declared inputs are
//! resolved recursively with deduplication and cycle detection keyed on
//! canonical identity.

pub mod errors;
pub mod lock;
pub mod resolve;

pub use errors::ResolveError;
pub use lock::{LockError, LockFile, LockedInput, LOCK_FILE_NAME, LOCK_VERSION};
pub use resolve::{Flake, LockMode, NonFlakeDep, ResolvedFlake, Resolver};
