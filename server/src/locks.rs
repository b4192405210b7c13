//! Per-player async locks.
//!
//! Score edits and recomputes of one player are serialized; different players
//! never wait on each other.

use std::collections::HashMap;
use std::sync::Arc;

use handicap::PlayerId;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct PlayerLocks {
    inner: Arc<Mutex<HashMap<PlayerId, Arc<Mutex<()>>>>>,
}

impl PlayerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `player`. Released when the guard drops.
    pub async fn acquire(&self, player: PlayerId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(player).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_player_is_exclusive() {
        let locks = PlayerLocks::new();
        let guard = locks.acquire(PlayerId(1)).await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move { contender.acquire(PlayerId(1)).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_players_do_not_block() {
        let locks = PlayerLocks::new();
        let _a = locks.acquire(PlayerId(1)).await;
        tokio::time::timeout(Duration::from_secs(1), locks.acquire(PlayerId(2)))
            .await
            .unwrap();
    }
}
