// Shared-snapshot registry: resolves share links (`/booking/{id}`) to saved snapshots.
// Unlike the store, the vault enforces expiry.

use crate::config::VaultConfig;
use crate::snapshot::{BookingSnapshot, SnapshotError};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct VaultStats {
    pub items_count: AtomicUsize,
    pub hit_count: AtomicUsize,
    pub miss_count: AtomicUsize,
    pub eviction_count: AtomicUsize,
    pub expired_count: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VaultStatsReport {
    pub items_count: usize,
    pub hit_count: usize,
    pub miss_count: usize,
    pub eviction_count: usize,
    pub expired_count: usize,
}

pub trait SnapshotVault: Send + Sync + 'static {
    // Saves the snapshot under its id, replacing any previous entry with that id
    fn store(&self, snapshot: BookingSnapshot);

    // Resolves a share link; expired snapshots are dropped and reported as such
    fn get(&self, id: &str, now: DateTime<Utc>) -> Result<BookingSnapshot, SnapshotError>;

    fn remove(&self, id: &str) -> bool;

    // Drops every snapshot expired at `now`, returning how many were removed
    fn purge_expired(&self, now: DateTime<Utc>) -> usize;

    // Shrinking evicts the soonest-expiring snapshots
    fn resize(&self, max_entries: usize);

    fn stats(&self) -> VaultStatsReport;
}

pub struct InMemorySnapshotVault {
    entries: DashMap<String, BookingSnapshot>,
    config: RwLock<VaultConfig>,
    stats: VaultStats,
}

impl InMemorySnapshotVault {
    pub fn new(config: VaultConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config: RwLock::new(config),
            stats: VaultStats::default(),
        }
    }

    fn evict_soonest_expiring(&self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().expires_at)
            .map(|entry| entry.key().clone());

        if let Some(id) = victim {
            if self.remove_entry(&id) {
                self.stats.eviction_count.fetch_add(1, Ordering::SeqCst);
                tracing::debug!(snapshot = %id, "snapshot evicted to make room");
            }
        }
    }

    fn remove_entry(&self, id: &str) -> bool {
        if self.entries.remove(id).is_some() {
            self.stats.items_count.fetch_sub(1, Ordering::SeqCst);
            true
        } else {
            false
        }
    }
}

impl Default for InMemorySnapshotVault {
    fn default() -> Self {
        Self::new(VaultConfig::default())
    }
}

impl SnapshotVault for InMemorySnapshotVault {
    fn store(&self, snapshot: BookingSnapshot) {
        let max_entries = self.config.read().max_entries;

        if !self.entries.contains_key(&snapshot.id) {
            while self.entries.len() >= max_entries.max(1) {
                self.evict_soonest_expiring();
            }
        }

        tracing::debug!(snapshot = %snapshot.id, "storing snapshot");
        if self.entries.insert(snapshot.id.clone(), snapshot).is_none() {
            self.stats.items_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn get(&self, id: &str, now: DateTime<Utc>) -> Result<BookingSnapshot, SnapshotError> {
        let expired_at = match self.entries.get(id) {
            Some(entry) if !entry.is_expired_at(now) => {
                self.stats.hit_count.fetch_add(1, Ordering::SeqCst);
                return Ok(entry.value().clone());
            }
            Some(entry) => entry.expires_at,
            None => {
                self.stats.miss_count.fetch_add(1, Ordering::SeqCst);
                return Err(SnapshotError::NotFound(id.to_string()));
            }
        };

        // Read guard is released above before removing
        if self.remove_entry(id) {
            self.stats.expired_count.fetch_add(1, Ordering::SeqCst);
        }
        tracing::info!(snapshot = id, %expired_at, "snapshot expired");
        Err(SnapshotError::Expired {
            id: id.to_string(),
            expired_at,
        })
    }

    fn remove(&self, id: &str) -> bool {
        self.remove_entry(id)
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.value().is_expired_at(now))
            .map(|entry| entry.key().clone())
            .collect();

        let mut count = 0;
        for id in expired {
            if self.remove_entry(&id) {
                self.stats.expired_count.fetch_add(1, Ordering::SeqCst);
                count += 1;
            }
        }

        if count > 0 {
            tracing::info!(count, "purged expired snapshots");
        }
        count
    }

    fn resize(&self, max_entries: usize) {
        self.config.write().max_entries = max_entries;
        while self.entries.len() > max_entries {
            self.evict_soonest_expiring();
        }
    }

    fn stats(&self) -> VaultStatsReport {
        VaultStatsReport {
            items_count: self.stats.items_count.load(Ordering::SeqCst),
            hit_count: self.stats.hit_count.load(Ordering::SeqCst),
            miss_count: self.stats.miss_count.load(Ordering::SeqCst),
            eviction_count: self.stats.eviction_count.load(Ordering::SeqCst),
            expired_count: self.stats.expired_count.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BookingConfig;
    use crate::store::BookingState;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;
    use std::thread;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    // Snapshot created `offset_ms` after the base time (ids are time based)
    fn snapshot_at(offset_ms: i64) -> BookingSnapshot {
        BookingSnapshot::capture(
            &BookingState::default(),
            &BookingConfig::default(),
            base_time() + Duration::milliseconds(offset_ms),
        )
    }

    #[test]
    fn test_store_and_resolve() {
        let vault = InMemorySnapshotVault::default();
        let snapshot = snapshot_at(0);
        vault.store(snapshot.clone());

        let resolved = vault.get(&snapshot.id, base_time()).unwrap();
        assert_eq!(resolved, snapshot);

        let missing = vault.get("booking-0", base_time());
        assert!(matches!(missing, Err(SnapshotError::NotFound(_))));

        let stats = vault.stats();
        assert_eq!(stats.items_count, 1);
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
    }

    #[test]
    fn test_expired_snapshot_is_dropped_on_read() {
        let vault = InMemorySnapshotVault::default();
        let snapshot = snapshot_at(0);
        vault.store(snapshot.clone());

        let later = base_time() + Duration::days(8);
        match vault.get(&snapshot.id, later) {
            Err(SnapshotError::Expired { id, expired_at }) => {
                assert_eq!(id, snapshot.id);
                assert_eq!(expired_at, snapshot.expires_at);
            }
            other => panic!("Expected expired error, got {:?}", other),
        }

        // Gone after the first expired read
        assert!(matches!(
            vault.get(&snapshot.id, later),
            Err(SnapshotError::NotFound(_))
        ));
        let stats = vault.stats();
        assert_eq!(stats.expired_count, 1);
        assert_eq!(stats.items_count, 0);
    }

    #[test]
    fn test_same_id_overwrites() {
        let vault = InMemorySnapshotVault::default();
        let mut snapshot = snapshot_at(0);
        vault.store(snapshot.clone());

        snapshot.state.adults = 5;
        vault.store(snapshot.clone());

        assert_eq!(vault.stats().items_count, 1);
        assert_eq!(vault.get(&snapshot.id, base_time()).unwrap().state.adults, 5);
    }

    #[test]
    fn test_full_vault_evicts_soonest_expiring() {
        let vault = InMemorySnapshotVault::new(VaultConfig { max_entries: 3 });
        let snapshots: Vec<BookingSnapshot> = (0..4).map(snapshot_at).collect();
        for snapshot in &snapshots {
            vault.store(snapshot.clone());
        }

        assert!(vault.get(&snapshots[0].id, base_time()).is_err());
        for snapshot in &snapshots[1..] {
            assert!(vault.get(&snapshot.id, base_time()).is_ok());
        }
        let stats = vault.stats();
        assert_eq!(stats.items_count, 3);
        assert_eq!(stats.eviction_count, 1);
    }

    #[test]
    fn test_purge_and_remove() {
        let vault = InMemorySnapshotVault::default();
        let old = snapshot_at(0);
        let fresh = BookingSnapshot::capture(
            &BookingState::default(),
            &BookingConfig::default(),
            base_time() + Duration::days(5),
        );
        vault.store(old.clone());
        vault.store(fresh.clone());

        let purged = vault.purge_expired(base_time() + Duration::days(7));
        assert_eq!(purged, 1);
        assert!(vault.get(&fresh.id, base_time() + Duration::days(7)).is_ok());

        assert!(vault.remove(&fresh.id));
        assert!(!vault.remove(&fresh.id));
        assert_eq!(vault.stats().items_count, 0);
    }

    #[test]
    fn test_resize_drops_entries() {
        let vault = InMemorySnapshotVault::default();
        for offset in 0..10 {
            vault.store(snapshot_at(offset));
        }
        vault.resize(4);

        let stats = vault.stats();
        assert_eq!(stats.items_count, 4);
        assert_eq!(stats.eviction_count, 6);
        // The four latest survive
        for offset in 6..10 {
            assert!(vault.get(&snapshot_at(offset).id, base_time()).is_ok());
        }
    }

    #[test]
    fn test_concurrent_share_and_resolve() {
        let vault = Arc::new(InMemorySnapshotVault::new(VaultConfig { max_entries: 200 }));
        let threads_count: usize = 8;
        let operations_per_thread: usize = 100;

        let mut handles = vec![];
        for i in 0..threads_count {
            let vault = Arc::clone(&vault);
            handles.push(thread::spawn(move || {
                for j in 0..operations_per_thread {
                    let snapshot = snapshot_at((i * operations_per_thread + j) as i64);
                    let id = snapshot.id.clone();
                    vault.store(snapshot);
                    let _ = vault.get(&id, base_time());
                    if j % 10 == 0 {
                        vault.remove(&id);
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = vault.stats();
        // Concurrent writers may each slip one entry past the limit
        assert!(
            stats.items_count <= 200 + threads_count,
            "Vault grew past its limit: {:?}",
            stats
        );
        assert_eq!(stats.items_count, vault.entries.len());
    }
}
