use std::collections::HashMap;
use std::sync::Arc;

use backend_domain::DomainId;
use tokio::sync::{Mutex, OwnedMutexGuard};

const PRUNE_THRESHOLD: usize = 1024;

/// Serializes the inventory read-decide-write sequence per player.
///
/// One mutex per `(domain, association)`. Idle entries are dropped once the
/// registry grows past a threshold; an entry is idle when nobody holds or
/// waits on its lock.
#[derive(Default)]
pub struct PlayerLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PlayerLocks {
    pub async fn acquire(&self, domain: &DomainId, association_id: &str) -> OwnedMutexGuard<()> {
        let key = format!("{}:{}", domain, association_id);
        let lock = {
            let mut locks = self.locks.lock().await;
            if locks.len() >= PRUNE_THRESHOLD {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_player_waits_for_the_holder() {
        let locks = Arc::new(PlayerLocks::default());
        let domain = DomainId::from("d1");
        let guard = locks.acquire(&domain, "p1").await;

        let contender = {
            let locks = locks.clone();
            let domain = domain.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&domain, "p1").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender acquires after release")
            .expect("task");
    }

    #[tokio::test]
    async fn different_players_do_not_contend() {
        let locks = PlayerLocks::default();
        let domain = DomainId::from("d1");
        let _first = locks.acquire(&domain, "p1").await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire(&domain, "p2")).await;
        assert!(second.is_ok());
        assert_eq!(locks.tracked().await, 2);
    }

    #[tokio::test]
    async fn domains_are_separate_keys() {
        let locks = PlayerLocks::default();
        let _first = locks.acquire(&DomainId::from("d1"), "p1").await;
        let second = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(&DomainId::from("d2"), "p1"),
        )
        .await;
        assert!(second.is_ok());
    }
}
