//! Audio files: path/encoding handler and the external downloader that fills the raw audio root.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, info};

use super::{MediaKind, MediaRef};
use crate::config::{DownloaderSettings, Paths};
use crate::data::dataset::{DatasetKind, State};
use crate::data::table::Table;
use crate::error::{Error, Result};

pub const PROCESSED_STATE: &str = "processed";

#[derive(Debug, Clone)]
pub struct AudioHandler {
    media: MediaRef,
}

impl AudioHandler {
    pub fn new(
        name: &str,
        extension: &str,
        category: Option<&str>,
        state: State,
        paths: &Paths,
    ) -> AudioHandler {
        AudioHandler {
            media: MediaRef::new(MediaKind::Audio, name, extension, category, state, paths),
        }
    }

    pub fn from_ref(media: MediaRef) -> AudioHandler {
        AudioHandler { media }
    }

    pub fn media(&self) -> &MediaRef {
        &self.media
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.media.resolve()
    }

    pub fn encoded_base64(&self) -> Result<String> {
        self.media.encoded_base64()
    }

    pub fn data_uri(&self) -> Result<String> {
        self.media.data_uri()
    }
}

/// Runs the configured downloader once per (name, url) of a kind's url view.
pub struct AudioDownloader<'a> {
    settings: &'a DownloaderSettings,
    paths: &'a Paths,
    kind: DatasetKind,
}

impl<'a> AudioDownloader<'a> {
    pub fn new(settings: &'a DownloaderSettings, paths: &'a Paths, kind: DatasetKind) -> AudioDownloader<'a> {
        AudioDownloader { settings, paths, kind }
    }

    fn url_view(&self) -> Result<(&'static str, &'static str)> {
        self.kind.profile().url_view.ok_or_else(|| Error::InvalidState {
            operation: "download audio of a dataset without youtube urls",
            state: State::named("youtube_urls"),
        })
    }

    /// Url registered for `name` in a `youtube_urls` table.
    pub fn youtube_url(&self, urls: &Table, name: &str) -> Result<String> {
        let (id_col, url_col) = self.url_view()?;
        let id_idx = urls.require_column(id_col)?;
        let url_idx = urls.require_column(url_col)?;
        urls.rows()
            .iter()
            .find(|row| row[id_idx].as_str() == Some(name))
            .and_then(|row| row[url_idx].as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::MediaNotFound(format!("no youtube url for '{name}' in {}", self.kind)))
    }

    /// `<raw_audio_root>/<category>/<name>.<ext>`
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.paths
            .raw_audios
            .join(self.kind.name())
            .join(format!("{name}.{}", self.settings.extension))
    }

    pub fn download(&self, name: &str, url: &str) -> Result<PathBuf> {
        let output = self.output_path(name);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
        }
        let output_arg = output.to_string_lossy();
        let args: Vec<String> = self
            .settings
            .args
            .iter()
            .map(|arg| arg.replace("{url}", url).replace("{output}", &output_arg))
            .collect();
        debug!(program = self.settings.program.as_str(), ?args, "running downloader");

        let status = Command::new(&self.settings.program)
            .args(&args)
            .status()
            .map_err(|err| Error::Download {
                name: name.to_string(),
                reason: format!("cannot run {}: {err}", self.settings.program),
            })?;
        if !status.success() {
            return Err(Error::Download {
                name: name.to_string(),
                reason: format!("{} exited with {status}", self.settings.program),
            });
        }
        info!(name, path = %output.display(), "downloaded audio");
        Ok(output)
    }

    /// Download every entry of `urls` in name order, skipping files already on disk.
    /// Returns the number of downloads performed.
    pub fn download_all(&self, urls: &Table) -> Result<usize> {
        let (id_col, url_col) = self.url_view()?;
        let id_idx = urls.require_column(id_col)?;
        let url_idx = urls.require_column(url_col)?;

        let mut entries: Vec<(&str, &str)> = urls
            .rows()
            .iter()
            .filter_map(|row| Some((row[id_idx].as_str()?, row[url_idx].as_str()?)))
            .collect();
        entries.sort();
        entries.dedup_by(|a, b| a.0 == b.0);

        let mut downloaded = 0;
        for (name, url) in entries {
            if self.output_path(name).is_file() {
                debug!(name, "audio already present");
                continue;
            }
            self.download(name, url)?;
            downloaded += 1;
        }
        Ok(downloaded)
    }
}
