//! Test utilities and mocks for Floe unit tests.
//!
//! Resolution consumes fetching and evaluation through traits, so tests
//! can run against a synthetic universe of flakes with no filesystem or
//! network behind it, while counting how often each source is touched.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::core::chain::RegistryChain;
use crate::core::reference::FlakeRef;
use crate::core::registry::{Registry, RegistryTier};
use crate::eval::{EvalError, Evaluator, FlakeInput, FlakeMetadata, SUPPORTED_EPOCH};
use crate::sources::{FetchError, Fetcher, SourceInfo};
use crate::util::hash::sha256_str;

/// Build a registry chain from `(tier, alias, target)` triples.
pub fn registry_chain(entries: &[(RegistryTier, &str, &str)]) -> RegistryChain {
    let mut flag = Registry::new(RegistryTier::Flag);
    let mut user = Registry::new(RegistryTier::User);
    let mut global = Registry::new(RegistryTier::Global);

    for (tier, from, to) in entries {
        let registry = match tier {
            RegistryTier::Flag => &mut flag,
            RegistryTier::User => &mut user,
            RegistryTier::Global => &mut global,
        };
        registry
            .upsert(
                FlakeRef::indirect(from).expect("test alias must be valid"),
                FlakeRef::parse(to).expect("test target must be valid"),
            )
            .expect("test entry must map an alias");
    }

    RegistryChain::new(flag, user, global)
}

/// A synthetic universe of flakes, acting as both fetcher and evaluator.
///
/// Flakes are registered under their declared reference; fetching fills in
/// the revision the way a real source would. All accesses are logged so
/// tests can assert fetch-once/parse-once properties.
#[derive(Default)]
pub struct FlakeUniverse {
    sources: HashMap<String, SourceInfo>,
    metadata: HashMap<String, FlakeMetadata>,
    fetch_log: Mutex<Vec<String>>,
    parse_log: Mutex<Vec<String>>,
}

impl FlakeUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flake reachable at `uri`, resolving to `uri?rev=<rev>`
    /// (or to itself when `rev` is empty, as for local paths), declaring
    /// the given `(name, uri, is_flake)` inputs.
    pub fn add_flake(&mut self, uri: &str, rev: &str, inputs: &[(&str, &str, bool)]) {
        let declared = FlakeRef::parse(uri).expect("test uri must be valid");
        let resolved = if rev.is_empty() {
            declared.clone()
        } else {
            declared.clone().with_rev(rev)
        };

        let info = SourceInfo {
            resolved_ref: resolved.clone(),
            rev_count: if rev.is_empty() { None } else { Some(1) },
            store_path: PathBuf::from(format!("/floe-store/{}", &sha256_str(uri)[..16])),
            content_hash: sha256_str(uri),
        };

        self.sources.insert(declared.to_string(), info.clone());
        self.sources.insert(resolved.to_string(), info);

        let metadata = FlakeMetadata {
            id: id_from_uri(uri),
            description: format!("test flake at {uri}"),
            epoch: SUPPORTED_EPOCH,
            inputs: inputs
                .iter()
                .map(|(name, input_uri, flake)| FlakeInput {
                    name: name.to_string(),
                    reference: FlakeRef::parse(input_uri).expect("test input must be valid"),
                    flake: *flake,
                })
                .collect(),
        };
        self.metadata.insert(resolved.to_string(), metadata);
    }

    /// How many times the given reference text was fetched.
    pub fn fetch_count(&self, reference: &str) -> usize {
        self.fetch_log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.as_str() == reference)
            .count()
    }

    /// How many times the given canonical identity was evaluated.
    pub fn parse_count(&self, identity: &str) -> usize {
        self.parse_log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.as_str() == identity)
            .count()
    }
}

fn id_from_uri(uri: &str) -> String {
    uri.rsplit(['/', ':'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("flake")
        .to_string()
}

impl Fetcher for FlakeUniverse {
    fn fetch(&self, reference: &FlakeRef) -> Result<SourceInfo, FetchError> {
        let key = reference.to_string();
        self.fetch_log.lock().unwrap().push(key.clone());

        if reference.is_indirect() {
            return Err(FetchError::UnresolvedAlias { reference: key });
        }
        self.sources
            .get(&key)
            .cloned()
            .ok_or(FetchError::NotFound { reference: key })
    }
}

impl Evaluator for FlakeUniverse {
    fn parse_flake(&self, source: &SourceInfo) -> Result<FlakeMetadata, EvalError> {
        let key = source.resolved_ref.to_string();
        self.parse_log.lock().unwrap().push(key.clone());

        self.metadata
            .get(&key)
            .cloned()
            .ok_or_else(|| EvalError::MissingManifest {
                path: source.store_path.clone(),
            })
    }
}
