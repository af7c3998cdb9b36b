use serde::{Deserialize, Serialize};

use crate::model::task::Priority;
use crate::model::view::{SortKey, StatusFilter};

/// Name of the storage slot holding the task collection
pub const DEFAULT_SLOT: &str = "tasks";

/// Configuration from config.toml in the data directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeckConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub defaults: DraftDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Slot (file stem) the collection is written to
    #[serde(default = "default_slot")]
    pub slot: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            slot: default_slot(),
        }
    }
}

fn default_slot() -> String {
    DEFAULT_SLOT.to_string()
}

/// Defaults for `td list` when no flag is given
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub status: StatusFilter,
}

/// Defaults applied to new drafts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftDefaults {
    #[serde(default)]
    pub priority: Priority,
}
