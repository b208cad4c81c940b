#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use ligoj::config::Settings;
use ligoj::data::registry::{Registry, DEFAULT_REGISTRY_PATH};
use tempfile::TempDir;

pub const SETTINGS_YAML: &str = "log:
  level: warn
data:
  raw: data/raw
  processed: data/processed
images:
  raw: images/raw
  processed: images/processed
audios:
  raw: audios/raw
  processed: audios/processed
";

/// An application root laid out the way `Settings::load` and `Registry::load` expect.
pub struct AppRoot {
    pub dir: TempDir,
}

impl AppRoot {
    pub fn new(registry_json: &str) -> AppRoot {
        AppRoot::with_settings(registry_json, SETTINGS_YAML)
    }

    pub fn with_settings(registry_json: &str, settings_yaml: &str) -> AppRoot {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        for sub in [
            "config",
            "data/raw",
            "data/processed",
            "images/raw",
            "images/processed",
            "audios/raw",
            "audios/processed",
        ] {
            fs::create_dir_all(dir.path().join(sub)).expect("layout should be created");
        }
        fs::write(dir.path().join("config/test.yaml"), settings_yaml).expect("settings should be written");
        let registry_path = dir.path().join(DEFAULT_REGISTRY_PATH);
        fs::create_dir_all(registry_path.parent().expect("registry has a parent"))
            .expect("registry dir should be created");
        fs::write(&registry_path, registry_json).expect("registry should be written");
        AppRoot { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn settings(&self) -> Settings {
        Settings::load(self.root(), "test").expect("settings should load")
    }

    pub fn registry(&self) -> Registry {
        Registry::load(self.root()).expect("registry should load")
    }

    pub fn write(&self, relative: &str, content: &[u8]) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent should be created");
        }
        fs::write(&path, content).expect("fixture should be written");
        path
    }
}
