use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::time::Instant;

use backend_domain::ports::InventorySnapshotCache;
use backend_domain::{DomainId, InventoryItem};

// Expiry used when `now + ttl` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// TTL key-value cache holding serialized values, keyed the way a shared
/// cache server would be.
#[derive(Default)]
pub struct MemorySnapshotCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemorySnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn set(&self, key: String, value: String, ttl: Duration) {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(key, CacheEntry { value, expires_at });
    }
}

fn inventory_key(domain: &DomainId, association_id: &str) -> String {
    format!("inventory:{}:{}", domain, association_id)
}

fn baseline_key(domain: &DomainId, association_id: &str) -> String {
    format!("inventory-baseline:{}:{}", domain, association_id)
}

#[async_trait]
impl InventorySnapshotCache for MemorySnapshotCache {
    async fn get_inventory(&self, domain: &DomainId, association_id: &str) -> Result<Option<Vec<InventoryItem>>> {
        let Some(raw) = self.get(&inventory_key(domain, association_id)).await else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn set_inventory(
        &self,
        domain: &DomainId,
        association_id: &str,
        items: &[InventoryItem],
        ttl: Duration,
    ) -> Result<()> {
        let raw = serde_json::to_string(items)?;
        self.set(inventory_key(domain, association_id), raw, ttl).await;
        Ok(())
    }

    async fn get_last_baseline(&self, domain: &DomainId, association_id: &str) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = self.get(&baseline_key(domain, association_id)).await else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn set_last_baseline(
        &self,
        domain: &DomainId,
        association_id: &str,
        at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<()> {
        let raw = serde_json::to_string(&at)?;
        self.set(baseline_key(domain, association_id), raw, ttl).await;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
