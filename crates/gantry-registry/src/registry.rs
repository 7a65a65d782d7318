//! The realm-based discovery contract and the static registry implementation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::RegistryError;
use crate::instance::{Instance, InstanceId};

/// The set of instance ids already tried for one top-level request.
///
/// Created empty per request, grows monotonically, and is discarded when the
/// request completes. Never shared across requests, so no locking applies.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet(HashSet<InstanceId>);

impl ExclusionSet {
    /// Create an empty exclusion set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an instance id as tried. Returns `false` if it was already
    /// present.
    pub fn insert(&mut self, id: InstanceId) -> bool {
        self.0.insert(id)
    }

    /// Whether the id has already been tried.
    #[must_use]
    pub fn contains(&self, id: &InstanceId) -> bool {
        self.0.contains(id)
    }

    /// Number of instances tried so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing has been tried yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the tried ids, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &InstanceId> {
        self.0.iter()
    }
}

/// A selection query: which realm, and which instances not to pick.
#[derive(Debug, Clone)]
pub struct InstanceQuery {
    /// The realm to select from.
    pub realm: String,
    /// Instance ids that must not be selected.
    pub excluding: ExclusionSet,
}

impl InstanceQuery {
    /// A query for the given realm with no exclusions.
    pub fn new(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            excluding: ExclusionSet::new(),
        }
    }

    /// Attach an exclusion set to the query.
    #[must_use]
    pub fn excluding(mut self, excluding: ExclusionSet) -> Self {
        self.excluding = excluding;
        self
    }
}

/// Realm-based service discovery.
///
/// Implementations are long-lived and may be queried concurrently by many
/// in-flight requests. `next` must fail rather than hang when no matching
/// instance exists.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Select one live instance matching the query.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoInstance`] when the realm has no candidate
    /// left outside the exclusion set, and [`RegistryError::Backend`] when
    /// the registry itself cannot answer.
    async fn next(&self, query: &InstanceQuery) -> Result<Arc<dyn Instance>, RegistryError>;
}

/// A registry over a statically configured realm → instance map.
///
/// Selection is round-robin per realm, skipping excluded ids. The cursor is
/// shared across requests so load spreads even when every request only ever
/// takes the first candidate.
#[derive(Default)]
pub struct StaticRegistry {
    realms: HashMap<String, Vec<Arc<dyn Instance>>>,
    cursors: Mutex<HashMap<String, usize>>,
}

impl StaticRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instance to a realm. Order of registration is the rotation
    /// order.
    pub fn register(&mut self, realm: impl Into<String>, instance: Arc<dyn Instance>) {
        self.realms.entry(realm.into()).or_default().push(instance);
    }

    /// Number of instances registered for a realm.
    #[must_use]
    pub fn realm_size(&self, realm: &str) -> usize {
        self.realms.get(realm).map_or(0, Vec::len)
    }
}

#[async_trait]
impl Registry for StaticRegistry {
    async fn next(&self, query: &InstanceQuery) -> Result<Arc<dyn Instance>, RegistryError> {
        let no_instance = || RegistryError::NoInstance {
            realm: query.realm.clone(),
        };

        let candidates: Vec<&Arc<dyn Instance>> = self
            .realms
            .get(&query.realm)
            .ok_or_else(no_instance)?
            .iter()
            .filter(|instance| !query.excluding.contains(instance.id()))
            .collect();

        if candidates.is_empty() {
            return Err(no_instance());
        }

        let picked = {
            let mut cursors = self.cursors.lock();
            let cursor = cursors.entry(query.realm.clone()).or_insert(0);
            let picked = candidates[*cursor % candidates.len()];
            *cursor = cursor.wrapping_add(1);
            picked
        };

        tracing::debug!(
            realm = %query.realm,
            instance = %picked.id(),
            excluded = query.excluding.len(),
            "instance selected"
        );

        Ok(Arc::clone(picked))
    }
}
