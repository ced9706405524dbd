//! Per-wallet list of created token mints.
//!
//! Two layouts exist in the wild:
//!
//! ```text
//! mints:<owner>  {"mints":["<mint>", ...],"activeMint":"<mint>"}   current
//! mint:<owner>   {"mint":"<mint>"}                                 legacy
//! ```
//!
//! The current key always wins. A legacy entry is migrated to the current
//! layout the first time it is read, and the legacy key is removed.

use std::sync::Arc;

use chain_sol::Pubkey;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{KeyValueStore, StorageError};

/// Mint addresses are kept as the strings that were stored; they are only
/// parsed when a balance has to be derived.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRecord {
    #[serde(default)]
    pub mints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_mint: Option<String>,
}

impl MintRecord {
    /// Keep the stored list; fall back to the first entry when the stored
    /// active mint is missing or not in the list.
    pub fn normalized(mut self) -> Self {
        let active_is_listed = self
            .active_mint
            .as_ref()
            .is_some_and(|active| self.mints.contains(active));
        if !active_is_listed {
            self.active_mint = self.mints.first().cloned();
        }
        self
    }

    /// Newest first, no duplicates, new mint active.
    pub fn with_new_mint(&self, mint: &str) -> Self {
        let mut mints = Vec::with_capacity(self.mints.len() + 1);
        for m in std::iter::once(mint).chain(self.mints.iter().map(String::as_str)) {
            if !mints.iter().any(|seen: &String| seen == m) {
                mints.push(m.to_string());
            }
        }
        Self {
            mints,
            active_mint: Some(mint.to_string()),
        }
    }

    /// Same list, different active entry. `None` when `mint` is not listed.
    pub fn with_active(&self, mint: &str) -> Option<Self> {
        self.mints.iter().any(|m| m == mint).then(|| Self {
            mints: self.mints.clone(),
            active_mint: Some(mint.to_string()),
        })
    }
}

#[derive(Deserialize)]
struct LegacyRecord {
    mint: String,
}

/// What a wallet's storage slots hold, before any migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredMints {
    Current(MintRecord),
    Legacy(String),
    None,
}

impl StoredMints {
    /// Interpret raw slot contents. Unreadable current data is treated as
    /// absent and does not fall through to the legacy slot.
    pub fn from_raw(current: Option<&str>, legacy: Option<&str>) -> Self {
        if let Some(raw) = current {
            return match serde_json::from_str::<MintRecord>(raw) {
                Ok(record) => StoredMints::Current(record.normalized()),
                Err(e) => {
                    warn!(error = %e, "discarding unreadable mint list");
                    StoredMints::None
                }
            };
        }

        match legacy.map(serde_json::from_str::<LegacyRecord>) {
            Some(Ok(LegacyRecord { mint })) if !mint.is_empty() => StoredMints::Legacy(mint),
            Some(Err(e)) => {
                warn!(error = %e, "discarding unreadable legacy mint entry");
                StoredMints::None
            }
            _ => StoredMints::None,
        }
    }
}

/// Rewrite a legacy entry in the current layout. Other variants pass
/// through unchanged.
pub fn migrate(stored: StoredMints) -> StoredMints {
    match stored {
        StoredMints::Legacy(mint) => StoredMints::Current(MintRecord {
            mints: vec![mint.clone()],
            active_mint: Some(mint),
        }),
        other => other,
    }
}

pub struct MintStore {
    store: Arc<dyn KeyValueStore>,
}

impl MintStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn current_key(owner: &Pubkey) -> String {
        format!("mints:{owner}")
    }

    pub fn legacy_key(owner: &Pubkey) -> String {
        format!("mint:{owner}")
    }

    fn read(&self, key: &str) -> Option<String> {
        self.store.get_item(key).unwrap_or_else(|e| {
            warn!(key, error = %e, "storage read failed");
            None
        })
    }

    pub fn load(&self, owner: &Pubkey) -> StoredMints {
        let current = self.read(&Self::current_key(owner));
        let legacy = match current {
            Some(_) => None,
            None => self.read(&Self::legacy_key(owner)),
        };
        StoredMints::from_raw(current.as_deref(), legacy.as_deref())
    }

    /// The current-layout record, if one is stored and readable.
    pub fn load_current(&self, owner: &Pubkey) -> Option<MintRecord> {
        match StoredMints::from_raw(self.read(&Self::current_key(owner)).as_deref(), None) {
            StoredMints::Current(record) => Some(record),
            _ => None,
        }
    }

    pub fn save(&self, owner: &Pubkey, record: &MintRecord) -> Result<(), StorageError> {
        let raw = serde_json::to_string(record)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        self.store.set_item(&Self::current_key(owner), &raw)
    }

    /// Load whatever is stored for `owner`, migrating a legacy entry in
    /// place. Storage write failures during migration are logged and the
    /// migrated record is still returned.
    pub fn rehydrate(&self, owner: &Pubkey) -> Option<MintRecord> {
        let stored = self.load(owner);
        let was_legacy = matches!(stored, StoredMints::Legacy(_));

        let StoredMints::Current(record) = migrate(stored) else {
            return None;
        };

        if was_legacy {
            let migrated = self
                .save(owner, &record)
                .and_then(|()| self.store.remove_item(&Self::legacy_key(owner)));
            match migrated {
                Ok(()) => debug!(%owner, "migrated legacy mint entry"),
                Err(e) => warn!(%owner, error = %e, "legacy mint migration not persisted"),
            }
        }

        Some(record)
    }
}
