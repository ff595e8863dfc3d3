//! Per-credential client cache
//!
//! One pooled [`ChatAdsClient`] per distinct credential, created lazily on
//! first use and shared across every request carrying that credential. The
//! registry is explicit state with an explicit [`clear`](ClientRegistry::clear)
//! hook, so tests (and credential rotation) can reset it deliberately.

use crate::client::ChatAdsClient;
use crate::config::ClientConfig;
use chatads_core::ChatAdsResult;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

static SHARED: Lazy<ClientRegistry> = Lazy::new(ClientRegistry::new);

/// Registry mapping credentials to long-lived clients
#[derive(Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<String, Arc<ChatAdsClient>>>,
}

impl ClientRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by the high-level entry points
    #[must_use]
    pub fn shared() -> &'static ClientRegistry {
        &SHARED
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<ChatAdsClient>>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the cached client for a credential, building one on first use.
    ///
    /// # Errors
    ///
    /// Returns `CONFIGURATION_ERROR` when a new client cannot be built from
    /// the given config.
    pub fn get_or_create(
        &self,
        api_key: &str,
        config: &ClientConfig,
    ) -> ChatAdsResult<Arc<ChatAdsClient>> {
        let mut clients = self.lock();
        if let Some(client) = clients.get(api_key) {
            return Ok(Arc::clone(client));
        }
        let client = Arc::new(ChatAdsClient::new(api_key, config.clone())?);
        clients.insert(api_key.to_string(), Arc::clone(&client));
        Ok(client)
    }

    /// Whether a client is cached for this credential
    #[must_use]
    pub fn contains(&self, api_key: &str) -> bool {
        self.lock().contains_key(api_key)
    }

    /// Number of cached clients
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every cached client; the next call per credential rebuilds one
    pub fn clear(&self) {
        self.lock().clear();
    }
}
