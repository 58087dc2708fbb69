//! Access to a trail's event selector configuration.

use async_trait::async_trait;
use dashmap::DashMap;

use acctstack_cloudtrail_model::EventSelector;

/// Error returned by a [`TrailSelectorStore`].
#[derive(Debug, thiserror::Error)]
pub enum TrailStoreError {
    /// The trail does not exist.
    #[error("trail not found: {0}")]
    TrailNotFound(String),

    /// The trail is configured in a way this store will not overwrite.
    #[error("trail {trail} is not supported: {reason}")]
    Unsupported {
        /// Trail name.
        trail: String,
        /// Why the trail cannot be managed.
        reason: String,
    },

    /// The remote API rejected the call.
    #[error("{0}")]
    Api(String),
}

/// Whole-document access to a trail's event selectors.
///
/// There is no partial update; implementations map onto
/// CloudTrail's `GetEventSelectors` and `PutEventSelectors`.
#[async_trait]
pub trait TrailSelectorStore: Send + Sync + std::fmt::Debug {
    /// Fetch the trail's current event selectors.
    async fn get_event_selectors(&self, trail: &str) -> Result<Vec<EventSelector>, TrailStoreError>;

    /// Replace the trail's event selectors with `selectors`.
    async fn put_event_selectors(
        &self,
        trail: &str,
        selectors: Vec<EventSelector>,
    ) -> Result<(), TrailStoreError>;
}

/// In-memory store for local development and tests.
#[derive(Debug, Default)]
pub struct InMemoryTrailStore {
    trails: DashMap<String, Vec<EventSelector>>,
}

impl InMemoryTrailStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a trail with the given selectors.
    pub fn insert_trail(&self, trail: impl Into<String>, selectors: Vec<EventSelector>) {
        self.trails.insert(trail.into(), selectors);
    }

    /// Current selectors of a trail.
    #[must_use]
    pub fn selectors(&self, trail: &str) -> Option<Vec<EventSelector>> {
        self.trails.get(trail).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl TrailSelectorStore for InMemoryTrailStore {
    async fn get_event_selectors(&self, trail: &str) -> Result<Vec<EventSelector>, TrailStoreError> {
        self.selectors(trail)
            .ok_or_else(|| TrailStoreError::TrailNotFound(trail.to_owned()))
    }

    async fn put_event_selectors(
        &self,
        trail: &str,
        selectors: Vec<EventSelector>,
    ) -> Result<(), TrailStoreError> {
        let Some(mut entry) = self.trails.get_mut(trail) else {
            return Err(TrailStoreError::TrailNotFound(trail.to_owned()));
        };
        *entry = selectors;
        Ok(())
    }
}
