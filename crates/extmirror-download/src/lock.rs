//! Named resource lock.
//!
//! An async mutex keyed by an arbitrary token (a sidecar path in practice).
//! The owner is an explicit [`LockOwner`] value rather than an ambient task
//! identity, so a task that already holds a token can acquire it again
//! without blocking. Entries are created lazily and removed once nobody
//! holds or waits for them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{trace, warn};

use extmirror_core::DownloadError;

/// Logical identity of a lock holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockOwner(u64);

impl LockOwner {
    /// A new, process-unique owner.
    #[must_use]
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for LockOwner {
    fn default() -> Self {
        Self::new()
    }
}

struct Entry {
    mutex: Arc<AsyncMutex<()>>,
    owner: Option<LockOwner>,
    depth: usize,
    waiters: usize,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Entry {
    fn new() -> Self {
        Self {
            mutex: Arc::new(AsyncMutex::new(())),
            owner: None,
            depth: 0,
            waiters: 0,
            guard: None,
        }
    }

    fn is_idle(&self) -> bool {
        self.waiters == 0 && self.owner.is_none() && self.mutex.try_lock().is_ok()
    }
}

/// Registry of per-token async locks.
///
/// Cloning is cheap and clones share the same registry.
#[derive(Clone, Default)]
pub struct NamedLock {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl std::fmt::Debug for NamedLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedLock")
            .field("tokens", &self.known_token_count())
            .finish()
    }
}

impl NamedLock {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire `token` for `owner`, waiting at most `timeout` if given.
    ///
    /// Re-entrant: if `owner` already holds `token` the recursion depth is
    /// bumped and the call returns immediately. On timeout the caller does
    /// not become the owner.
    pub async fn acquire(
        &self,
        token: &str,
        owner: LockOwner,
        timeout: Option<Duration>,
    ) -> Result<(), DownloadError> {
        let mutex = {
            let mut entries = self.entries();
            let entry = entries.entry(token.to_string()).or_insert_with(Entry::new);
            if entry.owner == Some(owner) {
                entry.depth += 1;
                trace!(token, depth = entry.depth, "Re-entered named lock");
                return Ok(());
            }
            entry.waiters += 1;
            Arc::clone(&entry.mutex)
        };

        // Runs on every exit path, including cancellation of this future.
        let _waiting = Waiting {
            lock: self,
            token,
            mutex: Arc::clone(&mutex),
        };

        let guard = match timeout {
            Some(limit) => tokio::time::timeout(limit, Arc::clone(&mutex).lock_owned())
                .await
                .map_err(|_| DownloadError::lock_timeout(token, limit))?,
            None => Arc::clone(&mutex).lock_owned().await,
        };

        let mut entries = self.entries();
        let entry = entries
            .get_mut(token)
            .filter(|e| Arc::ptr_eq(&e.mutex, &mutex))
            .ok_or_else(|| DownloadError::other(format!("lock entry for {token} vanished")))?;
        entry.owner = Some(owner);
        entry.depth = 1;
        entry.guard = Some(guard);
        Ok(())
    }

    /// Release one level of `owner`'s hold on `token`.
    ///
    /// Fails with an ownership error when `owner` does not hold `token`.
    pub fn release(&self, token: &str, owner: LockOwner) -> Result<(), DownloadError> {
        let mut entries = self.entries();
        let Some(entry) = entries.get_mut(token) else {
            return Err(DownloadError::ownership(token, "lock is not held"));
        };
        if entry.owner != Some(owner) {
            return Err(DownloadError::ownership(
                token,
                "lock is held by a different owner",
            ));
        }

        entry.depth -= 1;
        if entry.depth == 0 {
            entry.owner = None;
            entry.guard = None;
            if entry.is_idle() {
                entries.remove(token);
            }
        }
        Ok(())
    }

    /// Acquire `token` with a fresh owner and return a guard that releases
    /// it when dropped.
    pub async fn lock(
        &self,
        token: &str,
        timeout: Option<Duration>,
    ) -> Result<NamedLockGuard, DownloadError> {
        self.lock_as(token, LockOwner::new(), timeout).await
    }

    /// Like [`lock`](Self::lock) for an explicit owner, which may already
    /// hold `token`.
    pub async fn lock_as(
        &self,
        token: &str,
        owner: LockOwner,
        timeout: Option<Duration>,
    ) -> Result<NamedLockGuard, DownloadError> {
        self.acquire(token, owner, timeout).await?;
        Ok(NamedLockGuard {
            lock: self.clone(),
            token: token.to_string(),
            owner,
        })
    }

    /// Whether some owner currently holds `token`.
    #[must_use]
    pub fn is_locked(&self, token: &str) -> bool {
        self.entries()
            .get(token)
            .is_some_and(|e| e.owner.is_some())
    }

    /// Number of tokens with a live entry.
    #[must_use]
    pub fn known_token_count(&self) -> usize {
        self.entries().len()
    }

    fn stop_waiting(&self, token: &str, mutex: &Arc<AsyncMutex<()>>) {
        let mut entries = self.entries();
        let Some(entry) = entries.get_mut(token) else {
            return;
        };
        if !Arc::ptr_eq(&entry.mutex, mutex) {
            return;
        }
        entry.waiters = entry.waiters.saturating_sub(1);
        if entry.is_idle() {
            entries.remove(token);
        }
    }
}

struct Waiting<'a> {
    lock: &'a NamedLock,
    token: &'a str,
    mutex: Arc<AsyncMutex<()>>,
}

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        self.lock.stop_waiting(self.token, &self.mutex);
    }
}

/// Releases one level of a named lock on drop.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct NamedLockGuard {
    lock: NamedLock,
    token: String,
    owner: LockOwner,
}

impl NamedLockGuard {
    /// The locked token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The owner holding the lock.
    #[must_use]
    pub const fn owner(&self) -> LockOwner {
        self.owner
    }
}

impl std::fmt::Debug for NamedLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedLockGuard")
            .field("token", &self.token)
            .field("owner", &self.owner)
            .finish()
    }
}

impl Drop for NamedLockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.lock.release(&self.token, self.owner) {
            warn!(token = %self.token, error = %e, "Failed to release named lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_owners_never_overlap() {
        let lock = NamedLock::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let lock = lock.clone();
            let inside = Arc::clone(&inside);
            let max_seen = Arc::clone(&max_seen);
            tasks.push(tokio::spawn(async move {
                let _guard = lock.lock("sidecar.json", None).await.unwrap();
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(lock.known_token_count(), 0);
    }

    #[tokio::test]
    async fn test_reentrant_acquire_needs_matching_releases() {
        let lock = NamedLock::new();
        let owner = LockOwner::new();

        lock.acquire("t", owner, None).await.unwrap();
        lock.acquire("t", owner, Some(Duration::from_millis(1)))
            .await
            .unwrap();

        lock.release("t", owner).unwrap();
        assert!(lock.is_locked("t"));
        lock.release("t", owner).unwrap();
        assert!(!lock.is_locked("t"));
        assert_eq!(lock.known_token_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_does_not_take_ownership() {
        let lock = NamedLock::new();
        let holder = LockOwner::new();
        let other = LockOwner::new();
        lock.acquire("t", holder, None).await.unwrap();

        let err = lock
            .acquire("t", other, Some(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::LockTimeout { timeout_ms: 50, .. }));

        assert!(matches!(
            lock.release("t", other),
            Err(DownloadError::Ownership { .. })
        ));
        lock.release("t", holder).unwrap();
        assert_eq!(lock.known_token_count(), 0);
    }

    #[tokio::test]
    async fn test_release_without_holding_is_ownership_error() {
        let lock = NamedLock::new();
        let err = lock.release("never", LockOwner::new()).unwrap_err();
        assert!(matches!(err, DownloadError::Ownership { ref token, .. } if token == "never"));
    }

    #[tokio::test]
    async fn test_waiter_takes_over_after_release() {
        let lock = NamedLock::new();
        let first = lock.lock("t", None).await.unwrap();

        let waiter = {
            let lock = lock.clone();
            tokio::spawn(async move {
                let guard = lock.lock("t", None).await.unwrap();
                guard.owner()
            })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        let first_owner = first.owner();
        drop(first);
        let second_owner = waiter.await.unwrap();

        assert_ne!(first_owner, second_owner);
        assert_eq!(lock.known_token_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_waiter_does_not_leak_entry() {
        let lock = NamedLock::new();
        let holder = lock.lock("t", None).await.unwrap();

        let waiter = {
            let lock = lock.clone();
            tokio::spawn(async move { lock.lock("t", None).await.map(|_| ()) })
        };
        tokio::task::yield_now().await;
        waiter.abort();
        let _ = waiter.await;

        drop(holder);
        assert_eq!(lock.known_token_count(), 0);
    }

    #[tokio::test]
    async fn test_tokens_are_independent() {
        let lock = NamedLock::new();
        let _a = lock.lock("a", None).await.unwrap();
        let _b = lock.lock("b", Some(Duration::from_millis(10))).await.unwrap();
        assert!(lock.is_locked("a"));
        assert!(lock.is_locked("b"));
        assert_eq!(lock.known_token_count(), 2);
    }
}
