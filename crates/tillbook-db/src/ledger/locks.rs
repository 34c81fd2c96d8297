//! # Per-Channel Posting Locks
//!
//! The critical resource in the ledger is the current balance of a single
//! channel: the read-compute-insert in the posting engine must be one
//! atomic unit per channel, or two concurrent payments compute from the
//! same stale balance and one update is lost.
//!
//! ## Scope
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Worker 1: post(cash, +100)  ──┐                                       │
//! │  Worker 2: post(cash, +100)  ──┤── serialized on the cash lock         │
//! │                                 │                                       │
//! │  Worker 3: post(bank A, +50) ───── independent, runs in parallel       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One async mutex per channel, never a global lock. Acquisition is
//! bounded: when the wait expires the post fails with
//! `ConcurrentModification` and the caller retries the whole business
//! operation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::error::{LedgerError, LedgerResult};
use tillbook_core::Channel;

/// Registry of per-channel async locks.
///
/// Shared by every `Ledger` created from one `Database`, so postings stay
/// serialized per channel across all handles in the process.
#[derive(Debug, Default)]
pub(crate) struct ChannelLocks {
    inner: Mutex<HashMap<Channel, Arc<AsyncMutex<()>>>>,
}

impl ChannelLocks {
    /// Creates an empty lock registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock handle for a channel, creating it on first use.
    fn handle(&self, channel: &Channel) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        map.entry(channel.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Acquires the channel's lock, waiting at most `wait`.
    ///
    /// ## Errors
    /// `ConcurrentModification` when the wait expires. The engine never
    /// retries internally: retrying with stale input is the caller's call.
    pub async fn acquire(
        &self,
        channel: &Channel,
        wait: Duration,
    ) -> LedgerResult<OwnedMutexGuard<()>> {
        let handle = self.handle(channel);

        match tokio::time::timeout(wait, handle.lock_owned()).await {
            Ok(guard) => Ok(guard),
            Err(_) => Err(LedgerError::ConcurrentModification {
                channel: channel.to_string(),
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_channel_contends() {
        let locks = ChannelLocks::new();
        let _held = locks
            .acquire(&Channel::Cash, Duration::from_secs(1))
            .await
            .unwrap();

        let err = locks
            .acquire(&Channel::Cash, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ConcurrentModification { .. }));
    }

    #[tokio::test]
    async fn test_different_channels_are_independent() {
        let locks = ChannelLocks::new();
        let _cash = locks
            .acquire(&Channel::Cash, Duration::from_secs(1))
            .await
            .unwrap();

        // a bank channel is not blocked by the held cash lock
        let bank = locks
            .acquire(
                &Channel::Bank("acct-1".to_string()),
                Duration::from_millis(10),
            )
            .await;
        assert!(bank.is_ok());
    }

    #[tokio::test]
    async fn test_release_unblocks_next_waiter() {
        let locks = ChannelLocks::new();
        let held = locks
            .acquire(&Channel::Cash, Duration::from_secs(1))
            .await
            .unwrap();
        drop(held);

        assert!(locks
            .acquire(&Channel::Cash, Duration::from_millis(10))
            .await
            .is_ok());
    }
}
