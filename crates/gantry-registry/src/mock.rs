//! Mock registry and instance implementations for tests.
//!
//! Enabled for this crate's own tests and, behind the `test-utils` feature,
//! for downstream crates that need scripted discovery behavior.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{InstanceError, RegistryError};
use crate::instance::{Instance, InstanceId, InstanceResponse, RequestOptions};
use crate::registry::{InstanceQuery, Registry};

/// One recorded call against a [`MockInstance`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// The path the call was made against.
    pub path: String,
    /// The options the call carried.
    pub options: RequestOptions,
}

/// A scripted downstream instance.
///
/// Responses are consumed from a queue in FIFO order; once the queue is
/// empty, calls answer with an empty `200 OK`. Every call is recorded for
/// later assertions.
pub struct MockInstance {
    id: InstanceId,
    responses: Mutex<VecDeque<Result<InstanceResponse, InstanceError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockInstance {
    /// Create a mock instance with the given id.
    #[must_use]
    pub fn new(id: impl Into<InstanceId>) -> Self {
        Self {
            id: id.into(),
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response.
    pub fn enqueue_ok(&self, response: InstanceResponse) {
        self.responses.lock().push_back(Ok(response));
    }

    /// Queue a failure.
    pub fn enqueue_err(&self, error: InstanceError) {
        self.responses.lock().push_back(Err(error));
    }

    /// All calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Number of calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl Instance for MockInstance {
    fn id(&self) -> &InstanceId {
        &self.id
    }

    async fn request(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<InstanceResponse, InstanceError> {
        self.calls.lock().push(RecordedCall {
            path: path.to_owned(),
            options,
        });

        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(InstanceResponse::empty()))
    }
}

/// A scripted registry over mock instances.
///
/// Selection walks the registration order and returns the first instance not
/// present in the query's exclusion set; every query is recorded.
#[derive(Default)]
pub struct MockRegistry {
    realms: Mutex<HashMap<String, Vec<Arc<MockInstance>>>>,
    queries: Mutex<Vec<InstanceQuery>>,
}

impl MockRegistry {
    /// Create an empty mock registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instance to a realm.
    pub fn register(&self, realm: impl Into<String>, instance: Arc<MockInstance>) {
        self.realms
            .lock()
            .entry(realm.into())
            .or_default()
            .push(instance);
    }

    /// All selection queries seen so far, in order.
    #[must_use]
    pub fn queries(&self) -> Vec<InstanceQuery> {
        self.queries.lock().clone()
    }

    /// Number of selection queries seen so far.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.queries.lock().len()
    }
}

#[async_trait]
impl Registry for MockRegistry {
    async fn next(&self, query: &InstanceQuery) -> Result<Arc<dyn Instance>, RegistryError> {
        self.queries.lock().push(query.clone());

        let realms = self.realms.lock();
        let candidates = realms
            .get(&query.realm)
            .ok_or_else(|| RegistryError::NoInstance {
                realm: query.realm.clone(),
            })?;

        candidates
            .iter()
            .find(|instance| !query.excluding.contains(instance.id()))
            .map(|instance| Arc::clone(instance) as Arc<dyn Instance>)
            .ok_or_else(|| RegistryError::NoInstance {
                realm: query.realm.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ExclusionSet;
    use http::Method;

    #[tokio::test]
    async fn scripted_responses_are_consumed_in_order() {
        let instance = MockInstance::new("m-1");
        instance.enqueue_err(InstanceError::transport(None, "boom"));

        let err = instance
            .request("/a", RequestOptions::new(Method::GET))
            .await
            .unwrap_err();
        assert!(matches!(err, InstanceError::Transport { .. }));

        // Queue exhausted: defaults to an empty 200.
        let response = instance
            .request("/b", RequestOptions::new(Method::GET))
            .await
            .unwrap();
        assert_eq!(response.status, http::StatusCode::OK);

        let calls = instance.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].path, "/a");
        assert_eq!(calls[1].path, "/b");
    }

    #[tokio::test]
    async fn registry_honors_exclusions_and_records_queries() {
        let registry = MockRegistry::new();
        let a = Arc::new(MockInstance::new("a"));
        let b = Arc::new(MockInstance::new("b"));
        registry.register("orders", Arc::clone(&a));
        registry.register("orders", Arc::clone(&b));

        let picked = registry.next(&InstanceQuery::new("orders")).await.unwrap();
        assert_eq!(picked.id().as_str(), "a");

        let mut excluding = ExclusionSet::new();
        excluding.insert(InstanceId::new("a"));
        let picked = registry
            .next(&InstanceQuery::new("orders").excluding(excluding.clone()))
            .await
            .unwrap();
        assert_eq!(picked.id().as_str(), "b");

        excluding.insert(InstanceId::new("b"));
        let err = registry
            .next(&InstanceQuery::new("orders").excluding(excluding))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NoInstance { .. }));

        assert_eq!(registry.query_count(), 3);
        assert!(registry.queries()[0].excluding.is_empty());
    }
}
