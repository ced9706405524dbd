//! Root context handed to every component.
//!
//! One RPC client per app, built from one [`NetworkConfig`]. Components
//! receive the context by reference and clone the `Arc`s they keep.

use std::sync::Arc;

use crate::config::NetworkConfig;
use crate::explorer::Explorer;
use crate::rpc::http::HttpRpcClient;
use crate::rpc::{RpcClient, RpcError};
use crate::storage::KeyValueStore;
use crate::toast::Toaster;

#[derive(Clone)]
pub struct AppContext {
    pub config: NetworkConfig,
    pub rpc: Arc<dyn RpcClient>,
    pub storage: Arc<dyn KeyValueStore>,
    pub toaster: Toaster,
    pub explorer: Explorer,
}

impl AppContext {
    /// Wire an explicit client and store, e.g. an in-memory ledger in tests.
    pub fn new(
        config: NetworkConfig,
        rpc: Arc<dyn RpcClient>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let explorer = Explorer::new(config.cluster);
        Self {
            config,
            rpc,
            storage,
            toaster: Toaster::new(),
            explorer,
        }
    }

    /// JSON-RPC over HTTP to `config.endpoint`, with the platform's default
    /// store.
    pub fn from_config(config: NetworkConfig) -> Result<Self, RpcError> {
        let rpc = Arc::new(HttpRpcClient::new(&config)?);
        tracing::info!(
            endpoint = %config.endpoint,
            cluster = config.cluster.display_name(),
            "connection ready"
        );
        Ok(Self::new(config, rpc, default_store()))
    }
}

#[cfg(feature = "browser")]
fn default_store() -> Arc<dyn KeyValueStore> {
    Arc::new(crate::storage::BrowserStore)
}

#[cfg(not(feature = "browser"))]
fn default_store() -> Arc<dyn KeyValueStore> {
    Arc::new(crate::storage::MemoryStore::new())
}
