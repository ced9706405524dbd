//! Links into Solana Explorer.

use chain_sol::{Pubkey, Signature};

use crate::config::Cluster;

const EXPLORER_BASE: &str = "https://explorer.solana.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Explorer {
    cluster: Cluster,
}

impl Explorer {
    pub fn new(cluster: Cluster) -> Self {
        Self { cluster }
    }

    pub fn address_url(&self, address: &str) -> String {
        format!(
            "{EXPLORER_BASE}/address/{address}?cluster={}",
            self.cluster.explorer_param()
        )
    }

    pub fn account_url(&self, pubkey: &Pubkey) -> String {
        self.address_url(&pubkey.to_string())
    }

    pub fn tx_url(&self, signature: &Signature) -> String {
        format!(
            "{EXPLORER_BASE}/tx/{signature}?cluster={}",
            self.cluster.explorer_param()
        )
    }
}
