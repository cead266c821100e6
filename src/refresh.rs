//! Debounced refresh scheduling
//!
//! Every "refetch X soon" request goes through one [`Invalidator`]. Requests
//! for the same resource collapse into a single refresh at the earliest
//! requested deadline; a scheduled refresh is never pushed back.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Something the dashboard can refetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    /// Current conversation list page
    ConversationList,
    /// Current page of the open conversation
    Messages,
    /// Aggregate stats
    Stats,
}

/// Pending refresh deadlines keyed by resource
#[derive(Debug, Clone, Default)]
pub struct Invalidator {
    due: HashMap<Resource, Instant>,
}

impl Invalidator {
    /// Empty schedule
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a refresh of `resource` after `delay`
    ///
    /// # Returns
    /// The deadline now in effect for the resource
    pub fn invalidate(&mut self, resource: Resource, delay: Duration, now: Instant) -> Instant {
        let requested = now + delay;
        let deadline = self
            .due
            .entry(resource)
            .and_modify(|due| *due = (*due).min(requested))
            .or_insert(requested);
        *deadline
    }

    /// Drop a scheduled refresh, e.g. because a fetch just started anyway
    pub fn cancel(&mut self, resource: Resource) {
        self.due.remove(&resource);
    }

    /// Drop every scheduled refresh
    pub fn clear(&mut self) {
        self.due.clear();
    }

    /// Whether `resource` has a refresh scheduled
    pub fn is_scheduled(&self, resource: Resource) -> bool {
        self.due.contains_key(&resource)
    }

    /// Earliest scheduled deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.due.values().min().copied()
    }

    /// Remove and return every resource due at `now`, in a fixed order
    pub fn take_due(&mut self, now: Instant) -> Vec<Resource> {
        let mut ready: Vec<Resource> = self
            .due
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(resource, _)| *resource)
            .collect();
        ready.sort();
        for resource in &ready {
            self.due.remove(resource);
        }
        ready
    }
}
