//! Dataset registry: how each named dataset is loaded and treated.
//! Read from `data_factory/config/data_config.json` under the application root.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};

pub const DEFAULT_REGISTRY_PATH: &str = "data_factory/config/data_config.json";
pub const DEFAULT_YEAR_GROUP_WIDTH: u32 = 5;

/// `file_type` value marking a source that only exists as persisted snapshots.
pub const NO_RAW: &str = "no_raw";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kwargs: Option<Map<String, JsonValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cols_to_keep: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_group_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geocoding_endpoint: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, JsonValue>,
}

impl DatasetConfig {
    pub fn year_group_width(&self) -> u32 {
        self.year_group_width.unwrap_or(DEFAULT_YEAR_GROUP_WIDTH)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    path: PathBuf,
    entries: HashMap<String, DatasetConfig>,
}

impl Registry {
    /// Load the registry from its default location under `application_root`.
    pub fn load(application_root: &Path) -> Result<Registry> {
        Registry::from_path(&application_root.join(DEFAULT_REGISTRY_PATH))
    }

    pub fn from_path(path: &Path) -> Result<Registry> {
        let raw = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        let entries: HashMap<String, DatasetConfig> = serde_json::from_str(&raw)?;
        Ok(Registry {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn from_entries(path: impl Into<PathBuf>, entries: HashMap<String, DatasetConfig>) -> Registry {
        Registry {
            path: path.into(),
            entries,
        }
    }

    /// Path the registry was read from; quoted in missing-key errors.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Result<&DatasetConfig> {
        self.entries.get(name).ok_or_else(|| Error::UnknownDataset {
            name: name.to_string(),
            config_path: self.path.clone(),
        })
    }
}
