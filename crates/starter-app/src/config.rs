//! Network configuration: which cluster, which RPC endpoint, and how
//! eagerly to poll.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown cluster: {0}")]
    UnknownCluster(String),

    #[error("invalid {var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },
}

/// Solana clusters the starter can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    MainnetBeta,
    Localnet,
}

impl Cluster {
    /// Public RPC endpoint for this cluster.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Localnet => "http://127.0.0.1:8899",
        }
    }

    /// Value of the explorer's `cluster` query parameter.
    pub fn explorer_param(&self) -> &'static str {
        match self {
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
            Cluster::MainnetBeta => "mainnet-beta",
            Cluster::Localnet => "custom",
        }
    }

    /// Display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Cluster::Devnet => "Devnet",
            Cluster::Testnet => "Testnet",
            Cluster::MainnetBeta => "Mainnet Beta",
            Cluster::Localnet => "Localnet",
        }
    }

    /// Whether the cluster hands out free airdrops.
    pub fn supports_airdrop(&self) -> bool {
        !matches!(self, Cluster::MainnetBeta)
    }
}

impl FromStr for Cluster {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "mainnet" | "mainnet-beta" => Ok(Cluster::MainnetBeta),
            "localnet" | "localhost" => Ok(Cluster::Localnet),
            other => Err(ConfigError::UnknownCluster(other.to_string())),
        }
    }
}

/// Commitment level used for reads, subscriptions and confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }

    /// Whether a reported `confirmationStatus` satisfies this level.
    pub fn is_satisfied_by(&self, status: Commitment) -> bool {
        status >= *self
    }
}

impl PartialOrd for Commitment {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Commitment {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        fn rank(c: &Commitment) -> u8 {
            match c {
                Commitment::Processed => 0,
                Commitment::Confirmed => 1,
                Commitment::Finalized => 2,
            }
        }
        rank(self).cmp(&rank(other))
    }
}

const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Everything the connection provider needs to build its client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub endpoint: String,
    pub cluster: Cluster,
    pub commitment: Commitment,
    /// Interval for confirmation polling and polled account subscriptions.
    pub poll_interval_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::for_cluster(Cluster::Devnet)
    }
}

impl NetworkConfig {
    pub fn for_cluster(cluster: Cluster) -> Self {
        Self {
            endpoint: cluster.default_endpoint().to_string(),
            cluster,
            commitment: Commitment::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    /// Build a config from environment variables.
    ///
    /// - `SOLANA_CLUSTER`: `devnet` (default), `testnet`, `mainnet-beta`, `localnet`
    /// - `SOLANA_ENDPOINT`: RPC URL; defaults to the cluster's public endpoint
    /// - `SOLANA_POLL_INTERVAL_MS`: polling interval in milliseconds
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let cluster = match lookup("SOLANA_CLUSTER") {
            Some(raw) => raw.parse()?,
            None => Cluster::default(),
        };

        let mut config = Self::for_cluster(cluster);

        if let Some(endpoint) = lookup("SOLANA_ENDPOINT").filter(|e| !e.trim().is_empty()) {
            config.endpoint = endpoint.trim().to_string();
        }

        if let Some(raw) = lookup("SOLANA_POLL_INTERVAL_MS") {
            config.poll_interval_ms = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| ConfigError::InvalidVar {
                    var: "SOLANA_POLL_INTERVAL_MS",
                    reason: format!("expected a positive integer, got {raw:?}"),
                })?;
        }

        Ok(config)
    }
}
