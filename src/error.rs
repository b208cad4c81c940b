//! Crate-wide error type. Every failure propagates to the caller; nothing is recovered here.

use std::fmt;
use std::path::PathBuf;

use crate::data::dataset::State;

pub type Result<T> = std::result::Result<T, Error>;

/// Location of a missing key inside a config file, rendered the way the message is read by users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigKeyLocation {
    pub key: String,
    pub config_path: PathBuf,
    pub section: Option<String>,
    pub hint: Option<String>,
}

impl fmt::Display for ConfigKeyLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No '{}' key in {} config file", self.key, self.config_path.display())?;
        match &self.section {
            Some(section) => write!(f, " ('{section}' section).")?,
            None => write!(f, ".")?,
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n{hint}")?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    MissingConfigKey(Box<ConfigKeyLocation>),

    #[error("no raw data are available for '{dataset}', select another state")]
    NoRawDataAvailable { dataset: String },

    #[error("cannot {operation} from state '{state}'")]
    InvalidState { operation: &'static str, state: State },

    #[error("cannot save to state '{0}'")]
    InvalidTarget(State),

    #[error("the file {} already exists but overwrite is not set", .0.display())]
    AlreadyExists(PathBuf),

    #[error("no snapshot at {}", .0.display())]
    SnapshotNotFound(PathBuf),

    #[error("media not found: {0}")]
    MediaNotFound(String),

    #[error("not loadable '{tag}' file type, choose among {}", .accepted.join(", "))]
    UnsupportedFileType {
        tag: String,
        accepted: Vec<&'static str>,
    },

    #[error("no '{name}' entry in dataset config {}", .config_path.display())]
    UnknownDataset { name: String, config_path: PathBuf },

    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("geocoding '{place}' failed: {reason}")]
    Geocoding { place: String, reason: String },

    #[error("download of '{name}' failed: {reason}")]
    Download { name: String, reason: String },

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Excel(#[from] calamine::Error),

    #[error(transparent)]
    Shapefile(#[from] shapefile::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn missing_key(
        key: &str,
        config_path: impl Into<PathBuf>,
        section: Option<&str>,
        hint: Option<&str>,
    ) -> Self {
        Self::MissingConfigKey(Box::new(ConfigKeyLocation {
            key: key.to_string(),
            config_path: config_path.into(),
            section: section.map(str::to_string),
            hint: hint.map(str::to_string),
        }))
    }

    /// Wrap an i/o failure with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
