use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use parking_lot::RwLock;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Image not found")]
    NotFound,

    #[error("Image has expired")]
    Expired,
}

/// Source of the current time for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
pub struct StoredImage {
    pub data: Vec<u8>,
    pub inserted_at: Instant,
    pub expires_at: Instant,
}

impl StoredImage {
    fn new(data: Vec<u8>, now: Instant, ttl: Duration) -> Self {
        Self {
            data,
            inserted_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Short-lived in-memory image store.
///
/// Entries become invisible to reads as soon as their TTL has elapsed. Physical
/// removal happens in [`EphemeralStore::sweep`], which every [`EphemeralStore::get`]
/// runs first, and optionally in the background reaper.
#[derive(Clone)]
pub struct EphemeralStore {
    images: Arc<RwLock<HashMap<String, StoredImage>>>,
    clock: Arc<dyn Clock>,
    pub ttl: Duration,
}

impl EphemeralStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self::with_clock(Duration::from_secs(ttl_secs), Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            images: Arc::new(RwLock::new(HashMap::new())),
            clock,
            ttl,
        }
    }

    pub fn insert(&self, data: Vec<u8>) -> String {
        let id = Uuid::new_v4().to_string();
        let entry = StoredImage::new(data, self.clock.now(), self.ttl);

        debug!("Storing image {} ({} bytes)", id, entry.data.len());
        self.images.write().insert(id.clone(), entry);

        id
    }

    pub fn get(&self, id: &str) -> Result<Vec<u8>, StoreError> {
        let now = self.clock.now();
        let mut images = self.images.write();

        // The sweep and the lookup share one guard so nothing can slip in between.
        let mut requested_expired = false;
        let mut removed = 0;
        images.retain(|key, entry| {
            let keep = !entry.is_expired_at(now);
            if !keep {
                removed += 1;
                requested_expired |= key == id;
            }
            keep
        });
        if removed > 0 {
            debug!("Swept {} expired image(s)", removed);
        }

        if requested_expired {
            return Err(StoreError::Expired);
        }

        match images.get(id) {
            None => Err(StoreError::NotFound),
            Some(entry) if entry.is_expired_at(now) => {
                images.remove(id);
                Err(StoreError::Expired)
            }
            Some(entry) => {
                debug!(
                    "Serving image {} (age {}s)",
                    id,
                    now.saturating_duration_since(entry.inserted_at).as_secs()
                );
                Ok(entry.data.clone())
            }
        }
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut images = self.images.write();
        let before = images.len();
        images.retain(|_, entry| !entry.is_expired_at(now));
        before - images.len()
    }

    /// Time left before `id` expires, if it is still live.
    pub fn remaining(&self, id: &str) -> Option<Duration> {
        let now = self.clock.now();
        let images = self.images.read();
        images
            .get(id)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.expires_at.saturating_duration_since(now))
    }

    /// Ids physically present in the store, including expired entries not swept yet.
    pub fn ids(&self) -> Vec<String> {
        self.images.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.images.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.read().is_empty()
    }
}
