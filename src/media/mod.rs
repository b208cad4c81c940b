//! Media references: deterministic path resolution from (name, extension, category, state)
//! and base64 embedding of the file bytes.

pub mod audio;
pub mod image;

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::debug;

use crate::config::Paths;
use crate::data::dataset::State;
use crate::error::{Error, Result};

pub use self::audio::{AudioDownloader, AudioHandler};
pub use self::image::ImageHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    pub fn mime_type(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Audio => "audio",
        }
    }

    /// (raw root, processed root)
    pub fn roots(self, paths: &Paths) -> (&Path, &Path) {
        match self {
            MediaKind::Image => (&paths.raw_images, &paths.processed_images),
            MediaKind::Audio => (&paths.raw_audios, &paths.processed_audios),
        }
    }
}

/// `raw` → raw_root/[category/]; any other tag → processed_root/tag/[category/]; unset → none.
pub fn media_dir(
    raw_root: &Path,
    processed_root: &Path,
    category: Option<&str>,
    state: &State,
) -> Option<PathBuf> {
    let base = match state {
        State::Unset => return None,
        State::Raw => raw_root.to_path_buf(),
        State::Named(tag) => processed_root.join(tag),
    };
    Some(match category {
        Some(category) => base.join(category),
        None => base,
    })
}

/// Split `name.ext` at the last dot; ids may themselves contain dots.
pub(crate) fn split_file_name(file: &str) -> Option<(&str, &str)> {
    let path = Path::new(file);
    let stem = path.file_stem()?.to_str()?;
    let extension = path.extension()?.to_str()?;
    (!stem.is_empty() && !extension.is_empty()).then_some((stem, extension))
}

pub fn resolve_media_path(
    raw_root: &Path,
    processed_root: &Path,
    name: &str,
    extension: &str,
    category: Option<&str>,
    state: &State,
) -> Option<PathBuf> {
    media_dir(raw_root, processed_root, category, state)
        .map(|dir| dir.join(format!("{name}.{extension}")))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    kind: MediaKind,
    name: String,
    extension: String,
    category: Option<String>,
    state: State,
    raw_root: PathBuf,
    processed_root: PathBuf,
}

impl MediaRef {
    pub fn new(
        kind: MediaKind,
        name: &str,
        extension: &str,
        category: Option<&str>,
        state: State,
        paths: &Paths,
    ) -> MediaRef {
        let (raw_root, processed_root) = kind.roots(paths);
        MediaRef {
            kind,
            name: name.to_string(),
            extension: extension.to_string(),
            category: category.map(str::to_string),
            state,
            raw_root: raw_root.to_path_buf(),
            processed_root: processed_root.to_path_buf(),
        }
    }

    /// Find the file named `name.<any extension>` in the directory for (category, state).
    /// Entries are scanned in name order; the first match wins.
    pub fn discover(
        kind: MediaKind,
        name: &str,
        category: Option<&str>,
        state: State,
        paths: &Paths,
    ) -> Result<Option<MediaRef>> {
        let (raw_root, processed_root) = kind.roots(paths);
        let Some(dir) = media_dir(raw_root, processed_root, category, &state) else {
            return Ok(None);
        };
        if !dir.is_dir() {
            return Ok(None);
        }
        let mut files: Vec<String> = fs::read_dir(&dir)
            .map_err(|err| Error::io(&dir, err))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        files.sort();

        let found = files.iter().find_map(|file| match split_file_name(file) {
            Some((stem, extension)) if stem == name => Some(extension.to_string()),
            _ => None,
        });
        Ok(found.map(|extension| MediaRef::new(kind, name, &extension, category, state, paths)))
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn set_state(&mut self, state: State) {
        self.state = state;
    }

    pub fn set_extension(&mut self, extension: &str) {
        self.extension = extension.to_string();
    }

    pub fn resolve(&self) -> Option<PathBuf> {
        let path = resolve_media_path(
            &self.raw_root,
            &self.processed_root,
            &self.name,
            &self.extension,
            self.category.as_deref(),
            &self.state,
        );
        debug!(name = self.name.as_str(), state = %self.state, path = ?path, "resolved media path");
        path
    }

    /// Resolved path, failing for unset state or a file that does not exist.
    pub fn existing_path(&self) -> Result<PathBuf> {
        match self.resolve() {
            Some(path) if path.is_file() => Ok(path),
            Some(path) => Err(Error::MediaNotFound(path.display().to_string())),
            None => Err(Error::MediaNotFound(format!(
                "{}.{} has no path in state '{}'",
                self.name, self.extension, self.state
            ))),
        }
    }

    /// Standard base64 text of the file bytes.
    pub fn encoded_base64(&self) -> Result<String> {
        let path = self.existing_path()?;
        let bytes = fs::read(&path).map_err(|err| Error::io(&path, err))?;
        Ok(STANDARD.encode(bytes))
    }

    /// `data:<image|audio>/<ext>;base64,<data>`
    pub fn data_uri(&self) -> Result<String> {
        Ok(format!(
            "data:{}/{};base64,{}",
            self.kind.mime_type(),
            self.extension,
            self.encoded_base64()?
        ))
    }
}
