//! The SDK-local route table.

use std::collections::HashMap;

use honeycomb_core::ServiceProfile;
use serde::Deserialize;
use serde::Serialize;

/// Freshness of the local route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteStatus {
    /// The last profile fetch succeeded.
    Fresh,
    /// The last profile fetch failed; routes may be outdated or absent.
    Stale,
}

/// Result of a profile sync, memoized by `ready()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncInfo {
    /// When the sync completed, ms since the Unix epoch.
    pub ready_at: u64,
    /// Names of services known after the sync.
    pub services: Vec<String>,
    /// Freshness of the table the sync produced.
    pub status: RouteStatus,
}

/// Local snapshot of gateway profiles keyed by service name.
///
/// A single backing map with read-only accessors; rebuilds clear and refill
/// it in one step so readers never mix two syncs.
#[derive(Debug, Default)]
pub(crate) struct RouteTable {
    profiles: HashMap<String, ServiceProfile>,
    last_sync: u64,
    status: Option<RouteStatus>,
}

impl RouteTable {
    /// Replace the table contents from a successful fetch.
    pub(crate) fn rebuild(&mut self, profiles: Vec<ServiceProfile>, now: u64) {
        self.profiles.clear();
        for profile in profiles {
            self.profiles.insert(profile.name.clone(), profile);
        }
        self.last_sync = now;
        self.status = Some(RouteStatus::Fresh);
    }

    /// Record a failed fetch without touching existing routes.
    pub(crate) fn mark_stale(&mut self, now: u64) {
        self.last_sync = now;
        self.status = Some(RouteStatus::Stale);
    }

    /// Look up a profile by service name.
    pub(crate) fn profile(&self, name: &str) -> Option<&ServiceProfile> {
        self.profiles.get(name)
    }

    /// Known service names, sorted for stable output.
    pub(crate) fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.profiles.keys().cloned().collect();
        names.sort();
        names
    }

    /// Current freshness; `Stale` until a sync has run.
    pub(crate) fn status(&self) -> RouteStatus {
        self.status.unwrap_or(RouteStatus::Stale)
    }
}
