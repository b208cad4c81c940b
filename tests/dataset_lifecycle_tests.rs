mod common;

use std::path::Path;

use chrono::NaiveDate;
use common::AppRoot;
use ligoj::data::loader::LoaderOptions;
use ligoj::data::{Dataset, DatasetKind, State, Table, Value};
use ligoj::Error;

const REGISTRY: &str = r#"{
    "artists": {"raw_path": "artists.csv", "file_type": "csv", "kwargs": {"sep": ";"}},
    "scientists": {"raw_path": "scientists.csv", "file_type": "csv", "kwargs": {},
                   "cols_to_keep": ["name", "birth_place", "birth_year"]},
    "albums": {"file_type": "no_raw"},
    "localizations": {"raw_path": "places.csv", "file_type": "csv"},
    "collaboration_songs": {"file_type": "csv", "kwargs": {}}
}"#;

const ARTISTS_CSV: &str = "Artist ID;Nom de l'artiste;Birth Date;Death Date;Birth Place;YouTube URL
a1;Édith;01/06/85;;Paris;https://youtu.be/a1
a2;Léo;15/12/90;03/01/20;Monaco;
";

fn app() -> AppRoot {
    let app = AppRoot::new(REGISTRY);
    app.write("data/raw/artists.csv", ARTISTS_CSV.as_bytes());
    app.write(
        "data/raw/scientists.csv",
        b"Name,Birth date,Birth place\nCurie,07/11/79,Varsovie\n",
    );
    app
}

#[test]
fn raw_state_loads_registered_source() {
    let app = app();
    let dataset = Dataset::new(DatasetKind::Artists, State::Raw, &app.settings(), &app.registry()).unwrap();
    assert_eq!(dataset.data().shape(), (2, 6));
    assert_eq!(dataset.data().get(0, "Artist ID"), Some(&Value::Text("a1".into())));
    assert_eq!(dataset.state(), &State::Raw);
}

#[test]
fn unset_state_leaves_payload_empty() {
    let app = app();
    let dataset = Dataset::new(DatasetKind::Artists, State::Unset, &app.settings(), &app.registry()).unwrap();
    assert!(dataset.data().is_empty());
    assert!(dataset.data().columns().is_empty());
}

#[test]
fn no_raw_source_is_rejected() {
    let app = app();
    let err = Dataset::new(DatasetKind::Albums, State::Raw, &app.settings(), &app.registry()).unwrap_err();
    assert!(matches!(err, Error::NoRawDataAvailable { dataset } if dataset == "albums"));
}

#[test]
fn missing_config_keys_name_the_key() {
    let app = app();
    let settings = app.settings();
    let registry = app.registry();

    let err = Dataset::new(DatasetKind::Localizations, State::Raw, &settings, &registry).unwrap_err();
    assert!(matches!(&err, Error::MissingConfigKey(loc) if loc.key == "kwargs"));
    assert!(err.to_string().starts_with("No 'kwargs' key in "));
    assert!(err.to_string().contains("('localizations' section)."));

    let err = Dataset::new(DatasetKind::CollaborationSongs, State::Raw, &settings, &registry).unwrap_err();
    assert!(matches!(&err, Error::MissingConfigKey(loc) if loc.key == "raw_path"));
}

#[test]
fn unknown_dataset_entry_is_reported() {
    let app = AppRoot::new(r#"{"artists": {"file_type": "no_raw"}}"#);
    let err = Dataset::new(DatasetKind::Scientists, State::clean(), &app.settings(), &app.registry()).unwrap_err();
    assert!(matches!(err, Error::UnknownDataset { name, .. } if name == "scientists"));
}

#[test]
fn saving_to_raw_or_unset_is_an_invalid_target() {
    let app = app();
    let mut dataset = Dataset::new(DatasetKind::Artists, State::Raw, &app.settings(), &app.registry()).unwrap();
    assert!(matches!(dataset.save(State::Raw, true), Err(Error::InvalidTarget(State::Raw))));
    assert!(matches!(dataset.save(State::Unset, false), Err(Error::InvalidTarget(State::Unset))));
}

#[test]
fn second_save_needs_overwrite() {
    let app = app();
    let settings = app.settings();
    let registry = app.registry();
    let mut dataset = Dataset::new(DatasetKind::Artists, State::Raw, &settings, &registry).unwrap();

    dataset.save(State::named("draft"), false).unwrap();
    let err = dataset.save(State::named("draft"), false).unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(path) if path.ends_with("artists/draft.json")));

    dataset.data_mut().retain_rows(|row| row[0] == Value::Text("a1".into()));
    dataset.save(State::named("draft"), true).unwrap();
    let reloaded = Dataset::new(DatasetKind::Artists, State::named("draft"), &settings, &registry).unwrap();
    assert_eq!(reloaded.data().len(), 1);
}

#[test]
fn clean_snapshot_round_trips() {
    let app = app();
    let settings = app.settings();
    let registry = app.registry();
    let mut dataset = Dataset::new(DatasetKind::Artists, State::Raw, &settings, &registry).unwrap();
    dataset.clean().unwrap();
    dataset.save(State::clean(), false).unwrap();
    assert_eq!(dataset.state(), &State::clean());

    let reloaded = Dataset::new(DatasetKind::Artists, State::clean(), &settings, &registry).unwrap();
    assert_eq!(reloaded.data(), dataset.data());
}

#[test]
fn missing_snapshot_is_reported() {
    let app = app();
    let err = Dataset::new(DatasetKind::Artists, State::named("gold"), &app.settings(), &app.registry()).unwrap_err();
    assert!(matches!(err, Error::SnapshotNotFound(path) if path.ends_with("artists/gold.json")));
}

#[test]
fn clean_only_runs_on_raw() {
    let app = app();
    let settings = app.settings();
    let registry = app.registry();
    let mut dataset = Dataset::new(DatasetKind::Artists, State::Raw, &settings, &registry).unwrap();
    dataset.clean().unwrap();
    let err = dataset.clean().unwrap_err();
    assert!(matches!(err, Error::InvalidState { state, .. } if state == State::clean()));
}

#[test]
fn artists_clean_derives_birth_columns() {
    let app = app();
    let mut dataset =
        Dataset::new(DatasetKind::Artists, State::Raw, &app.settings(), &app.registry()).unwrap();
    dataset.clean().unwrap();
    let data = dataset.data();

    assert!(data.has_column("artist_id"));
    assert!(data.has_column("nom_de_l_artiste"));
    assert!(data.has_column("youtube_url"));
    assert_eq!(
        data.get(0, "birth_date"),
        Some(&Value::Date(NaiveDate::from_ymd_opt(1985, 6, 1).unwrap()))
    );
    assert_eq!(
        data.get(1, "birth_date"),
        Some(&Value::Date(NaiveDate::from_ymd_opt(1990, 12, 15).unwrap()))
    );
    assert_eq!(data.get(0, "death_date"), Some(&Value::Null));
    assert_eq!(data.get(0, "birth_year"), Some(&Value::Int(1985)));
    assert_eq!(data.get(1, "birth_year"), Some(&Value::Int(1990)));
    assert_eq!(data.get(0, "birth_half_decade"), Some(&Value::Int(1985)));
    assert_eq!(data.get(1, "birth_half_decade"), Some(&Value::Int(1990)));
}

#[test]
fn cols_to_keep_narrows_clean_payload() {
    let app = app();
    let mut dataset =
        Dataset::new(DatasetKind::Scientists, State::Raw, &app.settings(), &app.registry()).unwrap();
    dataset.clean().unwrap();
    assert_eq!(dataset.data().columns(), ["name", "birth_place", "birth_year"]);
    assert_eq!(dataset.data().get(0, "birth_year"), Some(&Value::Int(1979)));
}

#[test]
fn custom_loader_replaces_file_dispatch() {
    let app = app();
    let loader = |path: &Path, options: &LoaderOptions| -> ligoj::Result<Table> {
        assert!(path.ends_with("data/raw/artists.csv"));
        assert_eq!(options.delimiter, b';');
        let mut table = Table::new(["Artist ID"]);
        table.push_row(vec!["fake".into()]);
        Ok(table)
    };
    let dataset = Dataset::with_loader(
        DatasetKind::Artists,
        State::Raw,
        &app.settings(),
        &app.registry(),
        Some(&loader),
    )
    .unwrap();
    assert_eq!(dataset.data().get(0, "Artist ID"), Some(&Value::Text("fake".into())));
}

#[test]
fn youtube_urls_view_drops_rows_without_url() {
    let app = app();
    let mut dataset =
        Dataset::new(DatasetKind::Artists, State::Raw, &app.settings(), &app.registry()).unwrap();
    dataset.clean().unwrap();
    dataset.keep_only_youtube_urls().unwrap();
    assert_eq!(dataset.data().columns(), ["artist_id", "youtube_url"]);
    assert_eq!(dataset.data().len(), 1);
}

#[test]
fn missing_value_markers_survive_the_snapshot_round_trip() {
    let app = AppRoot::new(
        r#"{"localizations": {"raw_path": "places.csv", "file_type": "csv", "kwargs": {}}}"#,
    );
    app.write("data/raw/places.csv", b"Place,Lat,Lng\nParis,48.85,2.35\nAtlantis,NaN,NaN\nMu,NA,\n");
    let settings = app.settings();
    let registry = app.registry();

    let mut places = Dataset::new(DatasetKind::Localizations, State::Raw, &settings, &registry).unwrap();
    assert_eq!(places.data().get(1, "Lat"), Some(&Value::Null));
    assert_eq!(places.data().get(2, "Lat"), Some(&Value::Null));
    places.clean().unwrap();
    places.save(State::clean(), false).unwrap();

    let reloaded = Dataset::new(DatasetKind::Localizations, State::clean(), &settings, &registry).unwrap();
    assert_eq!(reloaded.data(), places.data());
    assert_eq!(reloaded.data().get(0, "lat"), Some(&Value::Float(48.85)));
    assert_eq!(reloaded.data().get(1, "lng"), Some(&Value::Null));
}

#[test]
fn non_finite_floats_are_saved_as_null() {
    let app = AppRoot::new(r#"{"localizations": {"file_type": "no_raw"}}"#);
    let settings = app.settings();
    let registry = app.registry();

    let mut places = Dataset::new(DatasetKind::Localizations, State::Unset, &settings, &registry).unwrap();
    let mut table = Table::new(["place", "lat"]);
    table.push_row(vec!["Atlantis".into(), Value::Float(f64::NAN)]);
    table.push_row(vec!["Paris".into(), 48.85.into()]);
    *places.data_mut() = table;
    places.save(State::clean(), false).unwrap();

    let reloaded = Dataset::new(DatasetKind::Localizations, State::clean(), &settings, &registry).unwrap();
    assert_eq!(reloaded.data().get(0, "lat"), Some(&Value::Null));
    assert_eq!(reloaded.data().get(1, "lat"), Some(&Value::Float(48.85)));
}
