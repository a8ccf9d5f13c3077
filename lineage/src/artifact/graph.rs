//! Arena of tracked artifacts keyed by identity.

use super::tracked::Lineage;
use super::{TaskDescriptor, TrackedArtifact};
use crate::config::LineageConfig;
use crate::document::{EntityRef, ProvDocument, ProvenanceDocument};
use crate::errors::{CycleDetectedError, LineageError, Result, StateError};
use crate::export::Exporter;
use crate::namespace::Namespaces;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info};

/// What a derivation points at: a tracked artifact or a raw entity handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivationSource {
    /// Another tracked artifact, by identity.
    Artifact(String),
    /// An entity that is not tracked here.
    Entity(EntityRef),
}

impl From<&str> for DerivationSource {
    fn from(identity: &str) -> Self {
        Self::Artifact(identity.to_string())
    }
}

impl From<String> for DerivationSource {
    fn from(identity: String) -> Self {
        Self::Artifact(identity)
    }
}

impl From<EntityRef> for DerivationSource {
    fn from(entity: EntityRef) -> Self {
        Self::Entity(entity)
    }
}

/// All artifacts of one pipeline run.
///
/// Ancestors are referenced by identity and resolved when lineage is
/// initialized, so artifacts may be tracked in any order. Initializing an
/// artifact also initializes every uninitialized artifact it descends from,
/// using the same task.
#[derive(Debug, Clone)]
pub struct LineageGraph<D = ProvDocument> {
    artifacts: IndexMap<String, TrackedArtifact<D>>,
    namespaces: Namespaces,
}

impl LineageGraph<ProvDocument> {
    /// Creates an empty graph with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&LineageConfig::default())
    }
}

impl Default for LineageGraph<ProvDocument> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: ProvenanceDocument> LineageGraph<D> {
    /// Creates an empty graph whose documents use `config.base_uri`.
    #[must_use]
    pub fn with_config(config: &LineageConfig) -> Self {
        Self {
            artifacts: IndexMap::new(),
            namespaces: Namespaces::artifact(&config.base_uri),
        }
    }

    /// The namespaces every artifact document declares.
    #[must_use]
    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    /// Adds an artifact.
    pub fn track(&mut self, artifact: TrackedArtifact<D>) -> Result<()> {
        if self.artifacts.contains_key(artifact.identity()) {
            return Err(StateError::duplicate(artifact.identity()).into());
        }
        debug!(
            artifact = artifact.identity(),
            ancestors = artifact.ancestors().len(),
            "Tracking artifact"
        );
        self.artifacts.insert(artifact.identity().to_string(), artifact);
        Ok(())
    }

    /// Looks up an artifact.
    #[must_use]
    pub fn get(&self, identity: &str) -> Option<&TrackedArtifact<D>> {
        self.artifacts.get(identity)
    }

    /// Returns true if `identity` is tracked.
    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.artifacts.contains_key(identity)
    }

    /// Number of tracked artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Returns true if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Identities in tracking order.
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }

    /// Artifacts in tracking order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackedArtifact<D>> {
        self.artifacts.values()
    }

    /// The document of an initialized artifact.
    #[must_use]
    pub fn document(&self, identity: &str) -> Option<&D> {
        self.get(identity).and_then(TrackedArtifact::document)
    }

    /// Returns whether an artifact's lineage has been initialized.
    pub fn is_initialized(&self, identity: &str) -> Result<bool> {
        Ok(self.lookup(identity)?.1.is_initialized())
    }

    /// Identities that no tracked artifact lists as an ancestor.
    pub fn terminals(&self) -> impl Iterator<Item = &str> {
        let referenced: HashSet<&str> = self
            .artifacts
            .values()
            .flat_map(|a| a.ancestors().iter().map(String::as_str))
            .collect();
        self.identities()
            .filter(move |id| !referenced.contains(id))
    }

    /// Every identity reachable through the ancestor relation, nearest first.
    pub fn lineage_of(&self, identity: &str) -> Result<Vec<&str>> {
        let (_, root) = self.lookup(identity)?;
        let mut seen: HashSet<&str> = HashSet::from([root.identity()]);
        let mut queue: VecDeque<&TrackedArtifact<D>> = VecDeque::from([root]);
        let mut result = Vec::new();

        while let Some(artifact) = queue.pop_front() {
            for ancestor in artifact.ancestors() {
                if !seen.insert(ancestor.as_str()) {
                    continue;
                }
                let (_, found) = self.lookup(ancestor)?;
                result.push(found.identity());
                queue.push_back(found);
            }
        }

        Ok(result)
    }

    /// Initializes an artifact's lineage, initializing its ancestors first.
    ///
    /// Unknown ancestors and cycles are reported before anything is modified;
    /// on any error no artifact changes state.
    pub fn initialize_lineage<T>(&mut self, identity: &str, task: &T) -> Result<()>
    where
        T: TaskDescriptor + ?Sized,
    {
        let (root, artifact) = self.lookup(identity)?;
        if artifact.is_initialized() {
            return Err(StateError::already_initialized(identity).into());
        }

        let order = self.initialization_order(root)?;
        let mut built: HashMap<usize, Lineage<D>> = HashMap::with_capacity(order.len());

        for &index in &order {
            let artifact = &self.artifacts[index];
            if index != root {
                debug!(
                    artifact = artifact.identity(),
                    descendant = identity,
                    "Initializing ancestor provenance"
                );
            }

            let mut views = Vec::with_capacity(artifact.ancestors().len());
            for ancestor in artifact.ancestors() {
                let (position, tracked) = self.lookup(ancestor)?;
                let view = match built.get(&position) {
                    Some(lineage) => (&lineage.document, &lineage.node),
                    None => match (tracked.document(), tracked.entity()) {
                        (Some(document), Some(node)) => (document, node),
                        _ => return Err(StateError::not_initialized(ancestor).into()),
                    },
                };
                views.push(view);
            }

            let lineage = artifact.build_lineage(task, &self.namespaces, &views)?;
            built.insert(index, lineage);
        }

        for (index, lineage) in built {
            self.artifacts[index].install(lineage);
        }

        info!(
            artifact = identity,
            task = task.name(),
            initialized = order.len(),
            "Initialized provenance"
        );
        Ok(())
    }

    /// Asserts a derivation from `identity` to `source`, tagged with the
    /// artifact's own activity.
    pub fn assert_derived_from(
        &mut self,
        identity: &str,
        source: impl Into<DerivationSource>,
    ) -> Result<()> {
        let entity = match source.into() {
            DerivationSource::Entity(entity) => entity,
            DerivationSource::Artifact(other) => self
                .lookup(&other)?
                .1
                .entity()
                .cloned()
                .ok_or_else(|| StateError::not_initialized(&other))?,
        };
        let (index, _) = self.lookup(identity)?;
        self.artifacts[index].was_derived_from(&entity)
    }

    /// Exports one artifact's lineage next to it.
    pub fn export_lineage(&self, identity: &str, exporter: &Exporter) -> Result<()> {
        self.lookup(identity)?.1.export_lineage(exporter)
    }

    fn lookup(&self, identity: &str) -> Result<(usize, &TrackedArtifact<D>)> {
        self.artifacts
            .get_full(identity)
            .map(|(index, _, artifact)| (index, artifact))
            .ok_or_else(|| LineageError::UnknownArtifact(identity.to_string()))
    }

    /// Post-order over `root` and its uninitialized ancestors.
    ///
    /// Ancestors come before their descendants and siblings keep list order.
    /// Already-initialized ancestors are not descended into: their documents
    /// hold their own lineage.
    fn initialization_order(&self, root: usize) -> Result<Vec<usize>> {
        let mut order = Vec::new();
        let mut done: HashSet<usize> = HashSet::new();
        // Artifacts on the current path, mapped to their depth in `stack`.
        let mut on_path: HashMap<usize, usize> = HashMap::from([(root, 0)]);
        // (artifact index, next ancestor position)
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];

        while let Some(top) = stack.last_mut() {
            let (index, position) = *top;
            top.1 += 1;

            let Some(ancestor) = self.artifacts[index].ancestors().get(position) else {
                stack.pop();
                on_path.remove(&index);
                done.insert(index);
                order.push(index);
                continue;
            };

            let (next, tracked) = self.lookup(ancestor)?;
            if done.contains(&next) || tracked.is_initialized() {
                continue;
            }
            if let Some(&start) = on_path.get(&next) {
                let mut cycle: Vec<String> = stack[start..]
                    .iter()
                    .map(|(i, _)| self.artifacts[*i].identity().to_string())
                    .collect();
                cycle.push(ancestor.clone());
                return Err(CycleDetectedError::new(cycle).into());
            }

            on_path.insert(next, stack.len());
            stack.push((next, 0));
        }

        Ok(order)
    }
}
