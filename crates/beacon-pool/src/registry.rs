//! Named connector registry.
//!
//! Service connectors (databases, caches, brokers, search clusters) all follow
//! the same shape: a table of named connection options registered at startup,
//! and one lazily dialed client per name. [`ConnectorRegistry`] captures that
//! shape on top of a [`ResourcePool`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{PoolError, PoolResult};
use crate::pool::ResourcePool;

/// Name used when a caller asks for the empty connector name.
pub const DEFAULT_CONNECTOR: &str = "default";

/// Connection options that can be checked before they are stored.
pub trait ConnectorOptions {
    /// Returns a human-readable reason if the options are unusable.
    fn validate(&self) -> Result<(), String>;
}

/// Registry of named connector options backed by a lazy client pool.
///
/// Options are validated at registration time; clients are only dialed when
/// first requested through [`get`](Self::get).
pub struct ConnectorRegistry<O, T, E> {
    options: Arc<RwLock<HashMap<String, O>>>,
    pool: ResourcePool<String, T, PoolError<E>>,
}

impl<O, T, E> ConnectorRegistry<O, T, E>
where
    O: ConnectorOptions + Clone + Send + Sync + 'static,
    T: 'static,
    E: 'static,
{
    /// Creates an empty registry that dials clients with `factory`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&str, &O) -> Result<T, E> + Send + Sync + 'static,
    {
        let options: Arc<RwLock<HashMap<String, O>>> = Arc::new(RwLock::new(HashMap::new()));
        let lookup = Arc::clone(&options);

        let pool = ResourcePool::new(move |name: &String| {
            let opts = lookup
                .read()
                .get(name)
                .cloned()
                .ok_or_else(|| PoolError::UnknownConnector { name: name.clone() })?;
            factory(name.as_str(), &opts).map_err(|source| PoolError::Creation {
                key: name.clone(),
                source,
            })
        });

        Self { options, pool }
    }

    /// Sets the callback used by [`close_all`](Self::close_all).
    #[must_use]
    pub fn with_closer<F>(mut self, closer: F) -> Self
    where
        F: Fn(&str, &T) -> bool + Send + Sync + 'static,
    {
        self.pool = self
            .pool
            .with_closer(move |name: &String, client: &T| closer(name.as_str(), client));
        self
    }

    /// Validates and stores `options` under `name`.
    ///
    /// Replacing the options of a name that already has a live client does
    /// not redial it; call [`remove`](Self::remove) to pick up the new
    /// options on the next [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidOptions`] if validation fails.
    pub fn register(&self, name: impl Into<String>, options: O) -> PoolResult<(), E> {
        let name = name.into();
        options
            .validate()
            .map_err(|reason| PoolError::InvalidOptions {
                name: name.clone(),
                reason,
            })?;

        let replaced = self.options.write().insert(name.clone(), options).is_some();
        info!(connector = %name, replaced, "registered connector");
        Ok(())
    }

    /// Registers a batch of connectors, stopping at the first invalid entry.
    ///
    /// Entries before the failing one stay registered.
    pub fn register_all<I, N>(&self, entries: I) -> PoolResult<(), E>
    where
        I: IntoIterator<Item = (N, O)>,
        N: Into<String>,
    {
        for (name, options) in entries {
            self.register(name, options)?;
        }
        Ok(())
    }

    /// Returns the client for `name`, dialing it on first use.
    ///
    /// An empty name resolves to [`DEFAULT_CONNECTOR`].
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::UnknownConnector`] if no options are registered
    /// under the name, or [`PoolError::Creation`] if the factory fails.
    pub fn get(&self, name: &str) -> PoolResult<Arc<T>, E> {
        let name = resolve(name);
        if !self.options.read().contains_key(name) {
            debug!(connector = %name, "lookup of unregistered connector");
            return Err(PoolError::UnknownConnector {
                name: name.to_string(),
            });
        }
        self.pool.get(&name.to_string()).map_err(PoolError::flatten)
    }

    /// Drops the live client for `name`; the options stay registered.
    pub fn remove(&self, name: &str) -> Option<Arc<T>> {
        self.pool.remove(&resolve(name).to_string())
    }

    /// Closes every live client. See [`ResourcePool::close_all`].
    pub fn close_all(&self) -> usize {
        self.pool.close_all()
    }

    /// Returns the registered connector names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.options.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Returns a copy of the options registered under `name`.
    #[must_use]
    pub fn options(&self, name: &str) -> Option<O> {
        self.options.read().get(resolve(name)).cloned()
    }

    /// Returns true if a client for `name` has been dialed.
    #[must_use]
    pub fn is_connected(&self, name: &str) -> bool {
        self.pool.contains(&resolve(name).to_string())
    }
}

impl<O, T, E> fmt::Debug for ConnectorRegistry<O, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorRegistry")
            .field("registered", &self.options.read().len())
            .field("pool", &self.pool)
            .finish()
    }
}

fn resolve(name: &str) -> &str {
    if name.is_empty() {
        DEFAULT_CONNECTOR
    } else {
        name
    }
}
