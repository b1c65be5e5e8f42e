//! The graph resolver.
//!
//! Resolution is a synchronous traversal over an explicit dedup map: each
//! concrete flake is fetched and evaluated once per traversal, keyed by
//! its canonical identity (the fully resolved reference). An in-progress
//! marker in the same map turns re-entry into cycle detection.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::core::chain::RegistryChain;
use crate::core::reference::FlakeRef;
use crate::eval::{Evaluator, FlakeMetadata};
use crate::resolver::errors::ResolveError;
use crate::resolver::lock::{LockFile, LOCK_FILE_NAME};
use crate::sources::{Fetcher, SourceInfo};

/// How an existing lock participates in resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Pin a path flake's direct inputs to the entries of its lock file.
    UseExisting,
    /// Ignore any existing lock and re-resolve everything.
    ForceUpdate,
    /// Like `UseExisting`, for callers that will not persist anything.
    ReadOnly,
}

/// A fetched and evaluated flake.
#[derive(Debug, Clone)]
pub struct Flake {
    pub metadata: FlakeMetadata,
    pub source: SourceInfo,
}

impl Flake {
    /// The canonical identity: the textual form of the fully resolved
    /// reference.
    pub fn identity(&self) -> String {
        self.source.resolved_ref.to_string()
    }
}

/// A fetched non-flake input. A leaf: never evaluated or recursed into.
#[derive(Debug, Clone)]
pub struct NonFlakeDep {
    pub name: String,
    pub source: SourceInfo,
}

/// A flake with all its inputs resolved. Shared subtrees are deduplicated
/// by canonical identity, so a diamond dependency is one node with two
/// parents.
#[derive(Debug)]
pub struct ResolvedFlake {
    pub flake: Flake,
    /// Resolved flake inputs, in declaration order.
    pub deps: Vec<(String, Arc<ResolvedFlake>)>,
    /// Fetched non-flake inputs, in declaration order.
    pub non_flake_deps: Vec<NonFlakeDep>,
}

impl ResolvedFlake {
    /// Breadth-first walk over the resolved graph, root first. Each
    /// distinct identity appears once, in queue order.
    pub fn walk(&self) -> Vec<&ResolvedFlake> {
        let mut queue: VecDeque<&ResolvedFlake> = VecDeque::new();
        let mut seen: HashSet<String> = HashSet::new();

        seen.insert(self.flake.identity());
        queue.push_back(self);

        let mut out = Vec::new();
        while let Some(node) = queue.pop_front() {
            out.push(node);
            for (_, dep) in &node.deps {
                if seen.insert(dep.flake.identity()) {
                    queue.push_back(dep);
                }
            }
        }
        out
    }
}

enum NodeState {
    InProgress,
    Done(Arc<ResolvedFlake>),
}

/// Resolves flake references against a registry chain, a fetcher and an
/// evaluator. One resolver instance spans one traversal; its memoization
/// does not outlive it.
pub struct Resolver<'a> {
    chain: &'a RegistryChain,
    fetcher: &'a dyn Fetcher,
    evaluator: &'a dyn Evaluator,
    /// Fetch results keyed by the concrete reference they were requested
    /// as, plus the identity they resolved to.
    fetched: HashMap<String, SourceInfo>,
    /// Node states keyed by canonical identity.
    nodes: HashMap<String, NodeState>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        chain: &'a RegistryChain,
        fetcher: &'a dyn Fetcher,
        evaluator: &'a dyn Evaluator,
    ) -> Self {
        Resolver {
            chain,
            fetcher,
            evaluator,
            fetched: HashMap::new(),
            nodes: HashMap::new(),
        }
    }

    /// Substitute aliases through the registry chain until a concrete
    /// reference is reached.
    ///
    /// Each step re-enters the full tier chain, so an override for an
    /// intermediate alias applies no matter which tier produced it. An
    /// alias seen twice in one chain is a configuration bug and fails
    /// loudly; an unmapped alias is returned unchanged and surfaces as a
    /// fetch failure.
    pub fn resolve_alias(&self, reference: &FlakeRef) -> Result<FlakeRef, ResolveError> {
        let mut current = reference.clone();
        let mut chain_seen: Vec<String> = Vec::new();

        while let FlakeRef::Indirect { alias, .. } = &current {
            if chain_seen.iter().any(|seen| seen == alias) {
                chain_seen.push(alias.clone());
                return Err(ResolveError::CyclicAlias {
                    reference: reference.to_string(),
                    chain: chain_seen,
                });
            }
            chain_seen.push(alias.clone());

            let next = self.chain.substitute_once(&current);
            if next == current {
                // A mapped alias that substitutes to itself is a cycle;
                // an unmapped one is a fixed point that surfaces as a
                // fetch failure.
                if self.chain.tiers().iter().any(|r| r.lookup(alias).is_some()) {
                    chain_seen.push(alias.clone());
                    return Err(ResolveError::CyclicAlias {
                        reference: reference.to_string(),
                        chain: chain_seen,
                    });
                }
                break;
            }
            current = next;
        }

        Ok(current)
    }

    /// Fetch a concrete reference, reusing the result for repeated
    /// requests of the same reference within this traversal.
    fn fetch_cached(&mut self, concrete: &FlakeRef) -> Result<SourceInfo, ResolveError> {
        let key = concrete.to_string();
        if let Some(info) = self.fetched.get(&key) {
            return Ok(info.clone());
        }

        let info = self.fetcher.fetch(concrete)?;
        tracing::debug!("fetched {} -> {}", key, info.resolved_ref);

        self.fetched.insert(key, info.clone());
        // Requests for the already-resolved form hit the same entry.
        self.fetched
            .entry(info.resolved_ref.to_string())
            .or_insert_with(|| info.clone());
        Ok(info)
    }

    /// Fetch and evaluate a single flake, without recursing into its
    /// inputs.
    pub fn get_flake(&mut self, reference: &FlakeRef) -> Result<Flake, ResolveError> {
        let concrete = self.resolve_alias(reference)?;
        let source = self.fetch_cached(&concrete)?;
        let metadata = self.evaluator.parse_flake(&source)?;
        Ok(Flake { metadata, source })
    }

    /// Resolve a flake and all its transitive inputs.
    pub fn resolve(
        &mut self,
        root: &FlakeRef,
        mode: LockMode,
    ) -> Result<Arc<ResolvedFlake>, ResolveError> {
        let concrete = self.resolve_alias(root)?;

        // Only a path flake has a mutable checkout to freeze; remote
        // references are already pinned by their revision.
        let lock = match (&concrete, mode) {
            (FlakeRef::Path { path }, LockMode::UseExisting | LockMode::ReadOnly) => {
                let lock = LockFile::load(&path.join(LOCK_FILE_NAME))?;
                if !lock.is_empty() {
                    tracing::debug!("using lock with {} pinned inputs", lock.inputs().len());
                }
                Some(lock)
            }
            _ => None,
        };

        self.resolve_node(&concrete, lock.as_ref())
    }

    fn resolve_node(
        &mut self,
        reference: &FlakeRef,
        lock: Option<&LockFile>,
    ) -> Result<Arc<ResolvedFlake>, ResolveError> {
        let concrete = self.resolve_alias(reference)?;
        let source = self.fetch_cached(&concrete)?;
        let identity = source.resolved_ref.to_string();

        match self.nodes.get(&identity) {
            Some(NodeState::Done(node)) => return Ok(Arc::clone(node)),
            Some(NodeState::InProgress) => {
                return Err(ResolveError::CyclicFlake {
                    reference: identity,
                });
            }
            None => {}
        }
        self.nodes.insert(identity.clone(), NodeState::InProgress);

        let metadata = self.evaluator.parse_flake(&source)?;
        tracing::debug!(
            "resolving {} declared inputs of {identity}",
            metadata.inputs.len()
        );

        let mut deps = Vec::new();
        let mut non_flake_deps = Vec::new();
        for input in &metadata.inputs {
            // A lock entry freezes a direct input regardless of what the
            // registries or the upstream currently resolve to.
            let declared = match lock.and_then(|l| l.get(&input.name)) {
                Some(pinned) => pinned.clone(),
                None => rebase_path_input(&source, &input.reference),
            };

            if input.flake {
                let node = self.resolve_node(&declared, None)?;
                deps.push((input.name.clone(), node));
            } else {
                let dep_concrete = self.resolve_alias(&declared)?;
                let dep_source = self.fetch_cached(&dep_concrete)?;
                non_flake_deps.push(NonFlakeDep {
                    name: input.name.clone(),
                    source: dep_source,
                });
            }
        }

        let node = Arc::new(ResolvedFlake {
            flake: Flake { metadata, source },
            deps,
            non_flake_deps,
        });
        self.nodes.insert(identity, NodeState::Done(Arc::clone(&node)));
        Ok(node)
    }
}

/// Resolve a relative path input against the declaring flake's own
/// location. Only meaningful when the parent is itself a path flake.
fn rebase_path_input(parent: &SourceInfo, declared: &FlakeRef) -> FlakeRef {
    if let (FlakeRef::Path { path }, FlakeRef::Path { path: base }) =
        (declared, &parent.resolved_ref)
    {
        if path.is_relative() {
            return FlakeRef::Path {
                path: base.join(path),
            };
        }
    }
    declared.clone()
}
