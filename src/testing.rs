//! Temporary workspaces for unit tests: directory layout, settings and a dataset registry.

use std::collections::HashMap;
use std::fs;

use tempfile::TempDir;

use crate::config::{DownloaderSettings, LogSettings, NetworkSettings, Paths, Settings};
use crate::data::dataset::{Dataset, DatasetKind, State};
use crate::data::registry::{DatasetConfig, Registry};
use crate::data::table::Table;

pub(crate) struct Workspace {
    pub dir: TempDir,
    pub settings: Settings,
    pub registry: Registry,
}

pub(crate) fn workspace(registry_json: &str) -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let paths = Paths {
        raw_data: root.join("data/raw"),
        processed_data: root.join("data/processed"),
        raw_images: root.join("images/raw"),
        processed_images: root.join("images/processed"),
        raw_audios: root.join("audios/raw"),
        processed_audios: root.join("audios/processed"),
    };
    for p in [
        &paths.raw_data,
        &paths.processed_data,
        &paths.raw_images,
        &paths.processed_images,
        &paths.raw_audios,
        &paths.processed_audios,
    ] {
        fs::create_dir_all(p).unwrap();
    }
    let entries: HashMap<String, DatasetConfig> = serde_json::from_str(registry_json).unwrap();
    let registry = Registry::from_entries(root.join("data_config.json"), entries);
    let settings = Settings {
        application_root: root.to_path_buf(),
        env: "test".to_string(),
        log: LogSettings::default(),
        paths,
        downloader: DownloaderSettings::default(),
        network: NetworkSettings::default(),
    };
    Workspace {
        dir,
        settings,
        registry,
    }
}

impl Workspace {
    /// Persist `table` as the `state` snapshot of `kind` and return it loaded back.
    pub fn seed(&self, kind: DatasetKind, state: &str, table: Table) -> Dataset {
        let mut dataset = Dataset::new(kind, State::Unset, &self.settings, &self.registry).unwrap();
        *dataset.data_mut() = table;
        dataset.save(State::named(state), true).unwrap();
        Dataset::new(kind, State::named(state), &self.settings, &self.registry).unwrap()
    }
}
