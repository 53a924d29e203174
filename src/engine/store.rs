// ABOUTME: Bounded in-memory store of workflow instances
// ABOUTME: Evicts finished instances by age and count; running instances are always kept

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::time::Duration;
use tracing::debug;

use super::context::InstanceContext;

#[derive(Debug)]
pub struct InstanceStore {
    entries: IndexMap<String, InstanceContext>,
    max_retained: usize,
    ttl: Option<Duration>,
}

impl InstanceStore {
    pub fn new(max_retained: usize, ttl: Option<Duration>) -> Self {
        Self {
            entries: IndexMap::new(),
            max_retained,
            ttl,
        }
    }

    pub fn insert(&mut self, instance: InstanceContext) {
        self.entries.insert(instance.id().to_string(), instance);
    }

    pub fn get(&self, instance_id: &str) -> Option<InstanceContext> {
        self.entries.get(instance_id).cloned()
    }

    pub fn contains(&self, instance_id: &str) -> bool {
        self.entries.contains_key(instance_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn handles(&self) -> Vec<InstanceContext> {
        self.entries.values().cloned().collect()
    }

    /// Drop finished instances past the TTL, then the oldest finished ones
    /// beyond the retention bound. Returns how many were removed.
    pub async fn evict(&mut self) -> usize {
        let now = Utc::now();
        let mut finished: Vec<(String, DateTime<Utc>)> = Vec::new();
        for (id, instance) in &self.entries {
            if let Some(finished_at) = instance.finished_at().await {
                finished.push((id.clone(), finished_at));
            }
        }
        finished.sort_by_key(|(_, finished_at)| *finished_at);

        let mut doomed: Vec<String> = Vec::new();
        // A TTL too large for chrono never expires anything
        if let Some(ttl) = self.ttl.and_then(|ttl| chrono::Duration::from_std(ttl).ok()) {
            finished.retain(|(id, finished_at)| {
                let expired = now - *finished_at > ttl;
                if expired {
                    doomed.push(id.clone());
                }
                !expired
            });
        }

        if finished.len() > self.max_retained {
            let excess = finished.len() - self.max_retained;
            doomed.extend(finished.drain(..excess).map(|(id, _)| id));
        }

        for id in &doomed {
            self.entries.shift_remove(id);
        }
        if !doomed.is_empty() {
            debug!(evicted = doomed.len(), retained = self.entries.len(), "Evicted finished instances");
        }
        doomed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::instance::WorkflowInstance;
    use crate::model::Variables;

    async fn finished(id: &str) -> InstanceContext {
        let ctx = InstanceContext::new(WorkflowInstance::new(id, "p", Variables::new()));
        ctx.mark_running().await;
        ctx.finish(None).await;
        ctx
    }

    fn running(id: &str) -> InstanceContext {
        InstanceContext::new(WorkflowInstance::new(id, "p", Variables::new()))
    }

    #[tokio::test]
    async fn test_count_bound_keeps_newest_finished() {
        let mut store = InstanceStore::new(2, None);
        store.insert(running("live"));
        for id in ["one", "two", "three"] {
            store.insert(finished(id).await);
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        assert_eq!(store.evict().await, 1);
        assert!(!store.contains("one"));
        assert!(store.contains("two"));
        assert!(store.contains("three"));
        assert!(store.contains("live"));
    }

    #[tokio::test]
    async fn test_ttl_never_touches_running() {
        let mut store = InstanceStore::new(100, Some(Duration::ZERO));
        store.insert(running("live"));
        store.insert(finished("done").await);
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(store.evict().await, 1);
        assert!(store.contains("live"));
        assert_eq!(store.len(), 1);
    }
}
