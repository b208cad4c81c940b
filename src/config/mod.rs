//! Process-wide settings: built once from `APPLICATION_ROOT` + `ENV` and `config/<env>.yaml`,
//! then passed by reference into every component.

pub mod logging;

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const ROOT_ENV_VAR: &str = "APPLICATION_ROOT";
pub const ENV_ENV_VAR: &str = "ENV";
pub const CONFIG_DIR: &str = "config";

/// Concrete roots for every kind of file the pipeline touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub raw_data: PathBuf,
    pub processed_data: PathBuf,
    pub raw_images: PathBuf,
    pub processed_images: PathBuf,
    pub raw_audios: PathBuf,
    pub processed_audios: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// External downloader invoked for audio acquisition. `{url}` and `{output}` in args are substituted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DownloaderSettings {
    #[serde(default = "default_downloader_program")]
    pub program: String,
    #[serde(default = "default_downloader_args")]
    pub args: Vec<String>,
    #[serde(default = "default_downloader_extension")]
    pub extension: String,
}

impl Default for DownloaderSettings {
    fn default() -> Self {
        DownloaderSettings {
            program: default_downloader_program(),
            args: default_downloader_args(),
            extension: default_downloader_extension(),
        }
    }
}

fn default_downloader_program() -> String {
    "yt-dlp".to_string()
}

fn default_downloader_args() -> Vec<String> {
    [
        "--format",
        "bestaudio/best",
        "--extract-audio",
        "--audio-format",
        "wav",
        "--audio-quality",
        "192K",
        "--output",
        "{output}",
        "{url}",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_downloader_extension() -> String {
    "wav".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NetworkSettings {
    #[serde(default)]
    pub category_colors: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawRoots {
    raw: PathBuf,
    processed: PathBuf,
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    log: LogSettings,
    data: RawRoots,
    images: RawRoots,
    audios: RawRoots,
    #[serde(default)]
    downloader: DownloaderSettings,
    #[serde(default)]
    network: NetworkSettings,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub application_root: PathBuf,
    pub env: String,
    pub log: LogSettings,
    pub paths: Paths,
    pub downloader: DownloaderSettings,
    pub network: NetworkSettings,
}

impl Settings {
    /// Read `APPLICATION_ROOT` and `ENV` and load the matching settings file.
    pub fn from_env() -> Result<Settings> {
        let root = non_empty_var(ROOT_ENV_VAR)?;
        let env_name = non_empty_var(ENV_ENV_VAR)?;
        Settings::load(Path::new(&root), &env_name)
    }

    /// Load `<root>/config/<env>.yaml`. Relative paths resolve against `root`; every data,
    /// image and audio root must already exist.
    pub fn load(root: &Path, env_name: &str) -> Result<Settings> {
        let config_path = settings_path(root, env_name);
        let raw = fs::read_to_string(&config_path).map_err(|err| {
            Error::Config(format!(
                "{} is not found or cannot be read: {err}",
                config_path.display()
            ))
        })?;
        let file: SettingsFile = serde_yaml::from_str(&raw)?;

        let resolve = |p: &Path| -> PathBuf {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                root.join(p)
            }
        };

        let paths = Paths {
            raw_data: resolve(&file.data.raw),
            processed_data: resolve(&file.data.processed),
            raw_images: resolve(&file.images.raw),
            processed_images: resolve(&file.images.processed),
            raw_audios: resolve(&file.audios.raw),
            processed_audios: resolve(&file.audios.processed),
        };
        for (label, dir) in [
            ("raw data", &paths.raw_data),
            ("processed data", &paths.processed_data),
            ("raw images", &paths.raw_images),
            ("processed images", &paths.processed_images),
            ("raw audios", &paths.raw_audios),
            ("processed audios", &paths.processed_audios),
        ] {
            if !dir.is_dir() {
                return Err(Error::Config(format!(
                    "{label} path {} folder doesn't exist",
                    dir.display()
                )));
            }
        }

        let mut log = file.log;
        log.file = log.file.map(|p| resolve(&p));
        logging::parse_level(&log.level)?;

        Ok(Settings {
            application_root: root.to_path_buf(),
            env: env_name.to_string(),
            log,
            paths,
            downloader: file.downloader,
            network: file.network,
        })
    }
}

pub fn settings_path(root: &Path, env_name: &str) -> PathBuf {
    root.join(CONFIG_DIR)
        .join(format!("{}.yaml", env_name.to_lowercase()))
}

fn non_empty_var(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Config(format!(
            "{name} environment variable is not defined"
        ))),
    }
}
