use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::{logging, Settings};
use crate::data::dataset::{Dataset, DatasetKind, State};
use crate::data::geocode::{add_new_places, GoogleGeocoder};
use crate::data::gold::GoldDataBuilder;
use crate::data::registry::Registry;
use crate::data::table::Table;
use crate::error::{Error, Result};
use crate::media::image::{process_raw_images, ImageOperation, DEFAULT_SIZE};
use crate::media::AudioDownloader;
use crate::viz::{MapOptions, MapVisualizer, NetworkColumns, NetworkVisualizer};

pub const YOUTUBE_URLS_STATE: &str = "youtube_urls";

#[derive(Debug, Parser)]
#[command(name = "ligoj", about = "Cultural datasets to maps and networks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Load the raw dataset, clean it and save the `clean` snapshot.
    Clean {
        #[arg(value_parser = parse_kind)]
        dataset: DatasetKind,
        #[arg(long)]
        overwrite: bool,
    },
    /// Narrow a clean dataset to its (id, youtube url) view and save it as `youtube_urls`.
    Urls {
        #[arg(value_parser = parse_kind)]
        dataset: DatasetKind,
        #[arg(long)]
        overwrite: bool,
    },
    /// Geocode the places of each subject missing from the localizations cache.
    Geocode {
        #[arg(required = true, value_parser = parse_kind)]
        subjects: Vec<DatasetKind>,
        /// Rebuild the localizations cache from raw data first.
        #[arg(long)]
        from_raw: bool,
    },
    /// Resize (or circle) every raw image.
    Images {
        #[arg(long)]
        circle: bool,
        #[arg(long, value_parser = parse_size)]
        size: Option<(u32, u32)>,
    },
    /// Download the audio of every entry in a category's `youtube_urls` snapshot.
    Download {
        #[arg(value_parser = parse_kind)]
        category: DatasetKind,
    },
    /// Render the located subject as a clustered map.
    Map {
        #[arg(value_parser = parse_kind)]
        subject: DatasetKind,
        #[arg(long)]
        group_by: String,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value = "artist_id")]
        id_column: String,
    },
    /// Render the artists collaboration network.
    Network {
        #[arg(long)]
        out: PathBuf,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Clean { .. } => "clean",
            Command::Urls { .. } => "urls",
            Command::Geocode { .. } => "geocode",
            Command::Images { .. } => "images",
            Command::Download { .. } => "download",
            Command::Map { .. } => "map",
            Command::Network { .. } => "network",
        }
    }
}

fn parse_kind(raw: &str) -> std::result::Result<DatasetKind, String> {
    DatasetKind::from_name(raw).ok_or_else(|| {
        let known: Vec<&str> = DatasetKind::ALL.iter().map(|k| k.name()).collect();
        format!("unknown dataset '{raw}', choose among {}", known.join(", "))
    })
}

/// `WxH`, e.g. `200x200`.
fn parse_size(raw: &str) -> std::result::Result<(u32, u32), String> {
    let invalid = || format!("invalid size '{raw}', expected WxH");
    let (w, h) = raw.split_once(|c: char| c == 'x' || c == 'X').ok_or_else(invalid)?;
    let w: u32 = w.trim().parse().map_err(|_| invalid())?;
    let h: u32 = h.trim().parse().map_err(|_| invalid())?;
    if w == 0 || h == 0 {
        return Err(invalid());
    }
    Ok((w, h))
}

pub fn parse_command(args: &[String]) -> std::result::Result<Command, clap::Error> {
    Cli::try_parse_from(args).map(|cli| cli.command)
}

pub fn run_with_args(args: &[String]) -> i32 {
    let command = match parse_command(args) {
        Ok(command) => command,
        Err(err) => {
            let _ = err.print();
            return err.exit_code();
        }
    };

    match run(&command) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{} failed: {err}", command.name());
            1
        }
    }
}

fn run(command: &Command) -> Result<()> {
    let settings = Settings::from_env()?;
    logging::init(&settings.log)?;
    let registry = Registry::load(&settings.application_root)?;
    info!(command = command.name(), env = settings.env.as_str(), "starting");

    match command {
        Command::Clean { dataset, overwrite } => handle_clean(&settings, &registry, *dataset, *overwrite),
        Command::Urls { dataset, overwrite } => handle_urls(&settings, &registry, *dataset, *overwrite),
        Command::Geocode { subjects, from_raw } => handle_geocode(&settings, &registry, subjects, *from_raw),
        Command::Images { circle, size } => handle_images(&settings, *circle, *size),
        Command::Download { category } => handle_download(&settings, &registry, *category),
        Command::Map {
            subject,
            group_by,
            out,
            id_column,
        } => handle_map(&settings, &registry, *subject, group_by, out, id_column),
        Command::Network { out } => handle_network(&settings, &registry, out),
    }
}

fn print_snapshot(dataset: &Dataset) {
    if let Some(path) = dataset.snapshot_path(dataset.state()) {
        println!("{}", path.display());
    }
}

fn handle_clean(settings: &Settings, registry: &Registry, kind: DatasetKind, overwrite: bool) -> Result<()> {
    let mut dataset = Dataset::new(kind, State::Raw, settings, registry)?;
    dataset.clean()?;
    dataset.save(State::clean(), overwrite)?;
    print_snapshot(&dataset);
    Ok(())
}

fn handle_urls(settings: &Settings, registry: &Registry, kind: DatasetKind, overwrite: bool) -> Result<()> {
    let mut dataset = Dataset::new(kind, State::clean(), settings, registry)?;
    dataset.keep_only_youtube_urls()?;
    dataset.save(State::named(YOUTUBE_URLS_STATE), overwrite)?;
    print_snapshot(&dataset);
    Ok(())
}

fn handle_geocode(
    settings: &Settings,
    registry: &Registry,
    subjects: &[DatasetKind],
    from_raw: bool,
) -> Result<()> {
    let mut localizations = if from_raw {
        let mut rebuilt = Dataset::new(DatasetKind::Localizations, State::Raw, settings, registry)?;
        rebuilt.clean()?;
        rebuilt.save(State::clean(), true)?;
        rebuilt
    } else {
        Dataset::new(DatasetKind::Localizations, State::clean(), settings, registry)?
    };
    let geocoder = GoogleGeocoder::from_dataset(&localizations)?;

    let mut added = 0;
    for kind in subjects {
        let subject = Dataset::new(*kind, State::clean(), settings, registry)?;
        added += add_new_places(&mut localizations, &subject, &geocoder)?;
    }
    localizations.save(State::clean(), true)?;
    println!("{added} new places");
    Ok(())
}

fn handle_images(settings: &Settings, circle: bool, size: Option<(u32, u32)>) -> Result<()> {
    let operation = if circle {
        ImageOperation::Circle
    } else {
        ImageOperation::Resize
    };
    let processed = process_raw_images(&settings.paths, operation, size.unwrap_or(DEFAULT_SIZE))?;
    println!("{processed} images processed");
    Ok(())
}

fn handle_download(settings: &Settings, registry: &Registry, kind: DatasetKind) -> Result<()> {
    let urls = Dataset::new(kind, State::named(YOUTUBE_URLS_STATE), settings, registry)?;
    let downloader = AudioDownloader::new(&settings.downloader, &settings.paths, kind);
    let downloaded = downloader.download_all(urls.data())?;
    println!("{downloaded} audio files downloaded");
    Ok(())
}

fn handle_map(
    settings: &Settings,
    registry: &Registry,
    kind: DatasetKind,
    group_by: &str,
    out: &Path,
    id_column: &str,
) -> Result<()> {
    let subject = Dataset::new(kind, State::clean(), settings, registry)?;
    let localizations = Dataset::new(DatasetKind::Localizations, State::clean(), settings, registry)?;
    let mut builder = GoldDataBuilder::new(&subject, &localizations);
    builder.add_locations()?;
    builder.drop_duplicates();
    let located = builder.into_located_data().unwrap_or_default();

    let options = MapOptions {
        id_column: id_column.to_string(),
        media_category: Some(kind.name().to_string()),
        place_column: subject.place_column().unwrap_or("birth_place").to_string(),
        ..MapOptions::default()
    };
    let mut map = MapVisualizer::with_options(&located, &settings.paths, options);
    map.create_map(group_by)?;
    let path = map.save_map(out)?;
    println!("{}", path.display());
    Ok(())
}

/// id column → value column, for every row where both are present.
fn lookup(table: &Table, key: &str, value: &str) -> Result<HashMap<String, String>> {
    let key_idx = table.require_column(key)?;
    let value_idx = table.require_column(value)?;
    Ok(table
        .rows()
        .iter()
        .filter(|row| !row[key_idx].is_null() && !row[value_idx].is_null())
        .map(|row| (row[key_idx].to_string(), row[value_idx].to_string()))
        .collect())
}

fn handle_network(settings: &Settings, registry: &Registry, out: &Path) -> Result<()> {
    let artists = Dataset::new(DatasetKind::Artists, State::clean(), settings, registry)?;
    let songs = Dataset::new(DatasetKind::CollaborationSongs, State::clean(), settings, registry)?;
    if settings.network.category_colors.is_empty() {
        return Err(Error::Config("network.category_colors is empty".to_string()));
    }

    let mut network = NetworkVisualizer::new(songs.data(), NetworkColumns::default(), &settings.paths)
        .with_node_titles(lookup(artists.data(), "artist_id", "name")?)
        .with_node_categories(lookup(artists.data(), "artist_id", "category")?)
        .with_category_colors(settings.network.category_colors.clone())
        .with_edge_audio_category(DatasetKind::CollaborationSongs.name());
    network.create_net_viz()?;
    let path = network.show(out)?;
    println!("{}", path.display());
    Ok(())
}
