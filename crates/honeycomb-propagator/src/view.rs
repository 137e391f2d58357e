//! The materialized profile map.

use std::collections::HashMap;
use std::sync::Arc;

use honeycomb_core::ServiceProfile;
use tokio::sync::RwLock;

/// Shared, read-mostly view of materialized service profiles.
///
/// The propagator task is the only writer; gateway handlers and tests read
/// concurrently. Rebuilds replace the whole map in one critical section so
/// readers never observe a half-built view.
#[derive(Clone, Default)]
pub struct ProfileView {
    inner: Arc<RwLock<HashMap<String, ServiceProfile>>>,
}

impl ProfileView {
    /// Create an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattened list of profiles, name-ordered for stable output.
    pub async fn snapshot(&self) -> Vec<ServiceProfile> {
        let map = self.inner.read().await;
        let mut profiles: Vec<ServiceProfile> = map.values().cloned().collect();
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        profiles
    }

    /// Look up one profile by service name.
    pub async fn get(&self, name: &str) -> Option<ServiceProfile> {
        self.inner.read().await.get(name).cloned()
    }

    /// Number of profiles currently materialized.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether no profiles are materialized.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Replace the entire map (bootstrap and rebuild path).
    pub(crate) async fn replace(&self, map: HashMap<String, ServiceProfile>) {
        *self.inner.write().await = map;
    }

    /// Mutate the map in one critical section (live-feed path).
    pub(crate) async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut HashMap<String, ServiceProfile>),
    {
        let mut map = self.inner.write().await;
        f(&mut map);
    }
}
