//! Place geocoding: the `Geocoder` port, its Google Maps implementation, and the
//! localizations cache augmentation.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::info;

use crate::data::dataset::{Dataset, DatasetKind};
use crate::data::table::{Table, Value};
use crate::error::{Error, Result};

pub const DEFAULT_GEOCODING_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";
pub const LAT_COLUMN: &str = "lat";
pub const LNG_COLUMN: &str = "lng";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[cfg_attr(test, mockall::automock)]
pub trait Geocoder {
    fn locate(&self, place: &str) -> Result<Coordinates>;
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

/// Blocking client for the Google Maps geocode API. One request per place, no retry.
pub struct GoogleGeocoder {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(api_key: impl Into<String>) -> GoogleGeocoder {
        GoogleGeocoder::with_endpoint(DEFAULT_GEOCODING_ENDPOINT, api_key)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, api_key: impl Into<String>) -> GoogleGeocoder {
        GoogleGeocoder {
            client: reqwest::blocking::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// Build from the localizations dataset config (`api_key`, optional `geocoding_endpoint`).
    pub fn from_dataset(localizations: &Dataset) -> Result<GoogleGeocoder> {
        let config = localizations.config();
        let api_key = config.api_key.as_deref().ok_or_else(|| {
            Error::missing_key(
                "api_key",
                localizations.config_path(),
                Some(localizations.name()),
                Some("It must hold the geocoding API key."),
            )
        })?;
        let endpoint = config
            .geocoding_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_GEOCODING_ENDPOINT);
        Ok(GoogleGeocoder::with_endpoint(endpoint, api_key))
    }

    /// Request url for `place`: spaces become `+`.
    pub fn request_url(&self, place: &str) -> String {
        format!(
            "{}?address={}&key={}",
            self.endpoint,
            place.replace(' ', "+"),
            self.api_key
        )
    }
}

impl Geocoder for GoogleGeocoder {
    fn locate(&self, place: &str) -> Result<Coordinates> {
        let response: GeocodeResponse = self
            .client
            .get(self.request_url(place))
            .send()?
            .error_for_status()?
            .json()?;
        let first = response.results.first().ok_or_else(|| Error::Geocoding {
            place: place.to_string(),
            reason: format!(
                "no results (status {})",
                response.status.as_deref().unwrap_or("unknown")
            ),
        })?;
        Ok(Coordinates {
            lat: first.geometry.location.lat,
            lng: first.geometry.location.lng,
        })
    }
}

/// Places of `subject` absent from `localizations`, deduplicated in first-seen order.
pub fn new_places(localizations: &Dataset, subject: &Dataset) -> Result<Vec<String>> {
    let subject_col = subject.place_column().ok_or_else(|| Error::InvalidState {
        operation: "geocode places of a dataset without place column",
        state: subject.state().clone(),
    })?;
    let loc_col = localizations
        .place_column()
        .ok_or_else(|| Error::MissingColumn("place".to_string()))?;

    let mut seen = HashSet::new();
    let mut places = Table::new([subject_col]);
    for cell in subject.data().column(subject_col)? {
        if let Value::Text(place) = cell {
            if seen.insert(place.clone()) {
                places.push_row(vec![cell.clone()]);
            }
        }
    }

    let mut known = if localizations.data().has_column(loc_col) {
        localizations.data().select(&[loc_col])?
    } else {
        Table::new([loc_col])
    };
    // A same-named key column is merged by the join; compare against a renamed copy.
    let probe = format!("{loc_col}__known");
    known.rename_column(loc_col, &probe)?;
    let joined = places.left_join(&known, subject_col, &probe)?;

    Ok(joined
        .rows()
        .iter()
        .filter(|row| row[1].is_null())
        .filter_map(|row| row[0].as_str().map(str::to_string))
        .collect())
}

/// Geocode every place of `subject` not already in `localizations` and append it.
/// The first failure propagates and leaves `localizations` untouched.
pub fn add_new_places(
    localizations: &mut Dataset,
    subject: &Dataset,
    geocoder: &dyn Geocoder,
) -> Result<usize> {
    if localizations.kind() != DatasetKind::Localizations {
        return Err(Error::InvalidState {
            operation: "add new places to a non-localizations dataset",
            state: localizations.state().clone(),
        });
    }
    let places = new_places(localizations, subject)?;
    let loc_col = localizations.place_column().unwrap_or("place");

    let mut located = Table::new([loc_col, LAT_COLUMN, LNG_COLUMN]);
    for place in &places {
        let coords = geocoder.locate(place)?;
        info!(place = place.as_str(), lat = coords.lat, lng = coords.lng, "geocoded place");
        located.push_row(vec![place.as_str().into(), coords.lat.into(), coords.lng.into()]);
    }

    let current = std::mem::take(localizations.data_mut());
    *localizations.data_mut() = Table::concat([current, located]);
    info!(
        subject = subject.name(),
        added = places.len(),
        total = localizations.data().len(),
        "localizations updated"
    );
    Ok(places.len())
}
