//! Dataset lifecycle: load (raw source or persisted snapshot) → clean → save under a new state.
//! One state machine for every dataset; per-kind behavior comes from a strategy table.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::data::columns::{clean_column_names, derive_birth_columns, DATE_FORMAT};
use crate::data::loader::{load_raw_data, LoaderOptions};
use crate::data::registry::{DatasetConfig, Registry, NO_RAW};
use crate::data::table::Table;
use crate::error::{Error, Result};

pub const SNAPSHOT_EXTENSION: &str = "json";

/// Where a dataset's payload comes from and, for saves, where it goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum State {
    Unset,
    Raw,
    Named(String),
}

impl State {
    pub fn from_tag(tag: Option<&str>) -> State {
        match tag.map(str::trim) {
            None | Some("") => State::Unset,
            Some("raw") => State::Raw,
            Some(other) => State::Named(other.to_string()),
        }
    }

    pub fn named(tag: &str) -> State {
        State::from_tag(Some(tag))
    }

    pub fn clean() -> State {
        State::Named("clean".to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            State::Unset => "unset",
            State::Raw => "raw",
            State::Named(tag) => tag,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loader used in place of the file-type dispatch.
pub type RawLoader<'a> = &'a dyn Fn(&Path, &LoaderOptions) -> Result<Table>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Artists,
    Scientists,
    Albums,
    Localizations,
    CollaborationSongs,
}

/// Per-kind behavior plugged into the shared lifecycle.
pub struct KindProfile {
    pub name: &'static str,
    pub place_column: Option<&'static str>,
    /// (id column, url column) of the lookup view used by audio acquisition.
    pub url_view: Option<(&'static str, &'static str)>,
    pub clean: fn(&mut Table, &DatasetConfig),
}

fn clean_names_only(table: &mut Table, _config: &DatasetConfig) {
    let cleaned = clean_column_names(table.columns());
    table.rename_columns(cleaned);
}

fn clean_people(table: &mut Table, config: &DatasetConfig) {
    clean_names_only(table, config);
    derive_birth_columns(table, DATE_FORMAT, config.year_group_width());
}

const ARTISTS: KindProfile = KindProfile {
    name: "artists",
    place_column: Some("birth_place"),
    url_view: Some(("artist_id", "youtube_url")),
    clean: clean_people,
};

const SCIENTISTS: KindProfile = KindProfile {
    name: "scientists",
    place_column: Some("birth_place"),
    url_view: None,
    clean: clean_people,
};

const ALBUMS: KindProfile = KindProfile {
    name: "albums",
    place_column: None,
    url_view: None,
    clean: clean_people,
};

const LOCALIZATIONS: KindProfile = KindProfile {
    name: "localizations",
    place_column: Some("place"),
    url_view: None,
    clean: clean_names_only,
};

const COLLABORATION_SONGS: KindProfile = KindProfile {
    name: "collaboration_songs",
    place_column: None,
    url_view: Some(("song_name", "youtube_url")),
    clean: clean_names_only,
};

impl DatasetKind {
    pub const ALL: [DatasetKind; 5] = [
        DatasetKind::Artists,
        DatasetKind::Scientists,
        DatasetKind::Albums,
        DatasetKind::Localizations,
        DatasetKind::CollaborationSongs,
    ];

    pub fn profile(self) -> &'static KindProfile {
        match self {
            DatasetKind::Artists => &ARTISTS,
            DatasetKind::Scientists => &SCIENTISTS,
            DatasetKind::Albums => &ALBUMS,
            DatasetKind::Localizations => &LOCALIZATIONS,
            DatasetKind::CollaborationSongs => &COLLABORATION_SONGS,
        }
    }

    pub fn name(self) -> &'static str {
        self.profile().name
    }

    pub fn from_name(name: &str) -> Option<DatasetKind> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    kind: DatasetKind,
    state: State,
    config: DatasetConfig,
    config_path: PathBuf,
    raw_root: PathBuf,
    save_dir: PathBuf,
    data: Table,
}

impl Dataset {
    /// Create a dataset and immediately load the payload matching `state`.
    pub fn new(
        kind: DatasetKind,
        state: State,
        settings: &Settings,
        registry: &Registry,
    ) -> Result<Dataset> {
        Dataset::with_loader(kind, state, settings, registry, None)
    }

    /// Like [`Dataset::new`], with `loader` used instead of the file-type dispatch for raw loads.
    pub fn with_loader(
        kind: DatasetKind,
        state: State,
        settings: &Settings,
        registry: &Registry,
        loader: Option<RawLoader<'_>>,
    ) -> Result<Dataset> {
        let config = registry.get(kind.name())?.clone();
        let mut dataset = Dataset {
            kind,
            state,
            config,
            config_path: registry.path().to_path_buf(),
            raw_root: settings.paths.raw_data.clone(),
            save_dir: settings.paths.processed_data.join(kind.name()),
            data: Table::default(),
        };
        dataset.load(loader)?;
        Ok(dataset)
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Registry file this dataset's config was read from.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn place_column(&self) -> Option<&'static str> {
        self.kind.profile().place_column
    }

    pub fn data(&self) -> &Table {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Table {
        &mut self.data
    }

    pub fn into_data(self) -> Table {
        self.data
    }

    /// Snapshot file for `state`; `None` for states that are never persisted.
    pub fn snapshot_path(&self, state: &State) -> Option<PathBuf> {
        match state {
            State::Named(tag) => Some(self.save_dir.join(format!("{tag}.{SNAPSHOT_EXTENSION}"))),
            State::Unset | State::Raw => None,
        }
    }

    fn missing_key(&self, key: &str, hint: &str) -> Error {
        Error::missing_key(key, &self.config_path, Some(self.name()), Some(hint))
    }

    /// (Re)load the payload for the current state.
    pub fn load(&mut self, loader: Option<RawLoader<'_>>) -> Result<()> {
        match &self.state {
            State::Unset => return Ok(()),
            State::Raw => {
                let raw_path = self.config.raw_path.as_deref().ok_or_else(|| {
                    self.missing_key("raw_path", "It must exist and be the path to the raw data to load.")
                })?;
                let file_type = self.config.file_type.as_deref().ok_or_else(|| {
                    self.missing_key(
                        "file_type",
                        "It must exist and its value must be the type of raw data file(s) to load.",
                    )
                })?;
                if file_type == NO_RAW {
                    return Err(Error::NoRawDataAvailable {
                        dataset: self.name().to_string(),
                    });
                }
                let kwargs = self.config.kwargs.as_ref().ok_or_else(|| {
                    self.missing_key(
                        "kwargs",
                        "It must exist. Its value must be the options to read the raw data file(s) or an empty object.",
                    )
                })?;
                let options = LoaderOptions::from_kwargs(kwargs);
                let path = self.raw_root.join(raw_path);
                debug!(dataset = self.name(), path = %path.display(), file_type, "loading raw data");
                self.data = match loader {
                    Some(custom) => custom(&path, &options)?,
                    None => load_raw_data(&path, file_type, &options)?,
                };
            }
            State::Named(_) => {
                let path = self
                    .snapshot_path(&self.state)
                    .unwrap_or_else(|| self.save_dir.clone());
                if !path.is_file() {
                    return Err(Error::SnapshotNotFound(path));
                }
                let raw = fs::read(&path).map_err(|err| Error::io(&path, err))?;
                self.data = serde_json::from_slice(&raw)?;
            }
        }
        self.log_shape("loaded");
        Ok(())
    }

    /// Persist the payload under `state` and move to it. Never to `raw`; never over an
    /// existing snapshot unless `overwrite`.
    pub fn save(&mut self, state: State, overwrite: bool) -> Result<()> {
        let Some(path) = self.snapshot_path(&state) else {
            return Err(Error::InvalidTarget(state));
        };
        if path.exists() && !overwrite {
            return Err(Error::AlreadyExists(path));
        }
        let replaced = self.data.null_non_finite();
        if replaced > 0 {
            warn!(dataset = self.name(), replaced, "non-finite floats saved as null");
        }
        fs::create_dir_all(&self.save_dir).map_err(|err| Error::io(&self.save_dir, err))?;
        let serialized = serde_json::to_vec(&self.data)?;
        fs::write(&path, serialized).map_err(|err| Error::io(&path, err))?;
        info!(dataset = self.name(), path = %path.display(), "saved snapshot");
        self.state = state;
        Ok(())
    }

    /// Run the kind's cleaning on a raw payload, then keep only `cols_to_keep` when configured.
    pub fn clean(&mut self) -> Result<()> {
        if self.state != State::Raw {
            return Err(Error::InvalidState {
                operation: "clean",
                state: self.state.clone(),
            });
        }
        (self.kind.profile().clean)(&mut self.data, &self.config);
        if let Some(cols) = &self.config.cols_to_keep {
            self.data = self.data.select(cols)?;
            self.log_shape("kept only useful columns");
        }
        self.state = State::clean();
        self.log_shape("cleaned");
        Ok(())
    }

    /// Narrow to the (id, url) lookup view, dropping rows without a url.
    pub fn keep_only_youtube_urls(&mut self) -> Result<()> {
        let Some((id_col, url_col)) = self.kind.profile().url_view else {
            return Err(Error::InvalidState {
                operation: "keep only youtube urls",
                state: self.state.clone(),
            });
        };
        let mut view = self.data.select(&[id_col, url_col])?;
        view.drop_nulls(url_col)?;
        self.data = view;
        self.log_shape("kept only youtube urls");
        Ok(())
    }

    fn log_shape(&self, message: &str) {
        let (rows, cols) = self.data.shape();
        info!(dataset = self.name(), state = %self.state, rows, cols, "{message}");
    }
}
