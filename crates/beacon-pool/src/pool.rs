//! Keyed lazy resource pool.
//!
//! [`ResourcePool`] maps a key to a single shared instance of an expensive
//! resource (a database handle, a broker connection, a webhook client).
//! Instances are created on first use and reused by every later caller.
//!
//! # Concurrency
//!
//! Lookups take the shared side of an [`RwLock`] and never contend with
//! each other. A miss falls through to a pool-wide creation [`Mutex`]; the
//! map is checked again under that mutex before the creator runs, so at most
//! one creation per key is ever in flight:
//!
//! 1. shared read of the map
//! 2. on miss, lock the creation mutex
//! 3. re-check the map
//! 4. on a second miss, run the creator and store the result
//!
//! The creation mutex is global to the pool, so creations of unrelated keys
//! serialize as well. Creation is rare relative to reads.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::{PoolError, PoolResult};

type Creator<K, T, E> = dyn Fn(&K) -> Result<T, E> + Send + Sync;
type Closer<K, T> = dyn Fn(&K, &T) -> bool + Send + Sync;

/// A concurrency-safe, lazily populated map from key to shared resource.
///
/// # Example
///
/// ```rust
/// use beacon_pool::ResourcePool;
/// use std::convert::Infallible;
///
/// let pool: ResourcePool<String, String, Infallible> =
///     ResourcePool::new(|name: &String| Ok(format!("client for {name}")));
///
/// let a = pool.get(&"orders".to_string()).unwrap();
/// let b = pool.get(&"orders".to_string()).unwrap();
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// ```
pub struct ResourcePool<K, T, E> {
    instances: RwLock<HashMap<K, Arc<T>>>,
    creation: Mutex<()>,
    creator: Box<Creator<K, T, E>>,
    closer: Option<Box<Closer<K, T>>>,
}

impl<K, T, E> ResourcePool<K, T, E>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// Creates an empty pool that builds missing resources with `creator`.
    pub fn new<F>(creator: F) -> Self
    where
        F: Fn(&K) -> Result<T, E> + Send + Sync + 'static,
    {
        Self {
            instances: RwLock::new(HashMap::new()),
            creation: Mutex::new(()),
            creator: Box::new(creator),
            closer: None,
        }
    }

    /// Sets the callback used by [`close_all`](Self::close_all).
    ///
    /// Returning `false` from the closer stops the bulk close; the remaining
    /// entries are left untouched.
    #[must_use]
    pub fn with_closer<F>(mut self, closer: F) -> Self
    where
        F: Fn(&K, &T) -> bool + Send + Sync + 'static,
    {
        self.closer = Some(Box::new(closer));
        self
    }

    /// Returns the resource for `key`, creating it on first access.
    ///
    /// Concurrent callers racing on the same missing key all receive the one
    /// instance produced by a single creator call.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Creation`] if the creator fails. Failures are not
    /// cached: the next call retries creation from scratch.
    pub fn get(&self, key: &K) -> PoolResult<Arc<T>, E> {
        if let Some(existing) = self.lookup(key) {
            return Ok(existing);
        }

        let creating = self.creation.lock();

        // Another caller may have finished creating while we waited.
        if let Some(existing) = self.lookup(key) {
            return Ok(existing);
        }

        let created = (self.creator)(key).map(|resource| {
            let resource = Arc::new(resource);
            self.instances
                .write()
                .insert(key.clone(), Arc::clone(&resource));
            resource
        });

        // Log only after unlocking: subscribers may call back into the pool.
        drop(creating);

        let resource = created.map_err(|source| {
            warn!(key = ?key, "resource creation failed");
            PoolError::Creation {
                key: format!("{key:?}"),
                source,
            }
        })?;
        debug!(key = ?key, "created pooled resource");

        Ok(resource)
    }

    /// Removes the entry for `key`, returning it if present.
    ///
    /// The next [`get`](Self::get) recreates the resource. Handles already
    /// given out stay valid; the pool does not track in-flight users.
    pub fn remove(&self, key: &K) -> Option<Arc<T>> {
        let removed = self.instances.write().remove(key);
        if removed.is_some() {
            debug!(key = ?key, "removed pooled resource");
        }
        removed
    }

    /// Runs the closer over every stored entry.
    ///
    /// Iteration order is unspecified. If the closer returns `false` the
    /// iteration stops and later entries are not closed in this call. Entries
    /// stay in the pool. Returns the number of closer invocations; a pool
    /// without a closer returns 0.
    pub fn close_all(&self) -> usize {
        let Some(closer) = self.closer.as_ref() else {
            return 0;
        };

        // Closers may block on network teardown; do not hold the map lock.
        let snapshot: Vec<(K, Arc<T>)> = self
            .instances
            .read()
            .iter()
            .map(|(key, value)| (key.clone(), Arc::clone(value)))
            .collect();

        let total = snapshot.len();
        let mut invoked = 0;
        for (key, value) in &snapshot {
            invoked += 1;
            if !closer(key, value) {
                info!(key = ?key, closed = invoked, total, "close stopped early");
                return invoked;
            }
        }

        info!(closed = invoked, "closed pooled resources");
        invoked
    }

    /// Returns true if a resource is stored for `key`.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.instances.read().contains_key(key)
    }

    /// Returns the number of stored resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    /// Returns true if no resources are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }

    /// Returns the keys currently stored, in unspecified order.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.instances.read().keys().cloned().collect()
    }

    fn lookup(&self, key: &K) -> Option<Arc<T>> {
        self.instances.read().get(key).cloned()
    }
}

impl<K, T, E> fmt::Debug for ResourcePool<K, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePool")
            .field("len", &self.instances.read().len())
            .field("has_closer", &self.closer.is_some())
            .finish_non_exhaustive()
    }
}
