//! Clustered Leaflet map of located rows, one toggleable layer per grouping value.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use super::popup::{artist_popup, media_tag};
use super::{script_json, write_html};
use crate::config::Paths;
use crate::data::dataset::State;
use crate::data::geocode::{LAT_COLUMN, LNG_COLUMN};
use crate::data::table::{Table, Value};
use crate::error::{Error, Result};
use crate::media::audio::PROCESSED_STATE;
use crate::media::image::RESIZED_STATE;
use crate::media::{MediaKind, MediaRef};

pub const MAP_CENTER: (f64, f64) = (27.374017, -42.144164);
pub const MAP_ZOOM: u8 = 3;
pub const MARKER_TOOLTIP: &str = "Clique !";
pub const MISSING_GROUP_LABEL: &str = "Non renseigné";
pub const BIRTH_DATE_DISPLAY_FORMAT: &str = "%m/%d/%Y";

static NULL: Value = Value::Null;

/// Which columns feed the popup and where its media live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapOptions {
    pub name_column: String,
    pub id_column: String,
    pub date_column: String,
    pub place_column: String,
    pub media_category: Option<String>,
    pub popup_width: u32,
    pub popup_height: u32,
}

impl Default for MapOptions {
    fn default() -> Self {
        MapOptions {
            name_column: "name".to_string(),
            id_column: "artist_id".to_string(),
            date_column: "birth_date".to_string(),
            place_column: "birth_place".to_string(),
            media_category: Some("artists".to_string()),
            popup_width: 600,
            popup_height: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lng: f64,
    pub tooltip: String,
    pub popup: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerGroup {
    pub label: String,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapModel {
    pub center: (f64, f64),
    pub zoom: u8,
    pub popup_width: u32,
    pub popup_height: u32,
    pub groups: Vec<MarkerGroup>,
}

pub struct MapVisualizer<'a> {
    data: &'a Table,
    paths: &'a Paths,
    options: MapOptions,
    map: Option<MapModel>,
}

impl<'a> MapVisualizer<'a> {
    /// `data` is the located gold table (subject columns plus `lat`/`lng`).
    pub fn new(data: &'a Table, paths: &'a Paths) -> MapVisualizer<'a> {
        MapVisualizer::with_options(data, paths, MapOptions::default())
    }

    pub fn with_options(data: &'a Table, paths: &'a Paths, options: MapOptions) -> MapVisualizer<'a> {
        MapVisualizer {
            data,
            paths,
            options,
            map: None,
        }
    }

    pub fn map(&self) -> Option<&MapModel> {
        self.map.as_ref()
    }

    pub fn create_map(&mut self, grouping_feature: &str) -> Result<&MapModel> {
        let group_idx = self.data.require_column(grouping_feature)?;
        let lat_idx = self.data.require_column(LAT_COLUMN)?;
        let lng_idx = self.data.require_column(LNG_COLUMN)?;

        let mut groups: BTreeMap<String, Vec<Marker>> = BTreeMap::new();
        let mut skipped = 0usize;
        for (position, row) in self.data.rows().iter().enumerate() {
            let label = match &row[group_idx] {
                Value::Null => MISSING_GROUP_LABEL.to_string(),
                value => value.to_string(),
            };
            let (Some(lat), Some(lng)) = (row[lat_idx].as_f64(), row[lng_idx].as_f64()) else {
                warn!(row = position, "no coordinates, marker skipped");
                skipped += 1;
                continue;
            };
            groups.entry(label).or_default().push(Marker {
                lat,
                lng,
                tooltip: MARKER_TOOLTIP.to_string(),
                popup: self.popup(position)?,
            });
        }

        let groups: Vec<MarkerGroup> = groups
            .into_iter()
            .map(|(label, markers)| MarkerGroup { label, markers })
            .collect();
        info!(
            grouping_feature,
            groups = groups.len(),
            markers = groups.iter().map(|g| g.markers.len()).sum::<usize>(),
            skipped,
            "map created"
        );
        Ok(self.map.insert(MapModel {
            center: MAP_CENTER,
            zoom: MAP_ZOOM,
            popup_width: self.options.popup_width,
            popup_height: self.options.popup_height,
            groups,
        }))
    }

    fn cell(&self, row: usize, column: &str) -> &Value {
        self.data.get(row, column).unwrap_or(&NULL)
    }

    fn popup(&self, row: usize) -> Result<String> {
        let name = self.cell(row, &self.options.name_column).to_string();
        let id = self.cell(row, &self.options.id_column).to_string();
        let date = match self.cell(row, &self.options.date_column) {
            Value::Date(date) => date.format(BIRTH_DATE_DISPLAY_FORMAT).to_string(),
            other => other.to_string(),
        };
        let place = self.cell(row, &self.options.place_column).to_string();
        let birth_line = [date, place]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let (img, audio) = if id.is_empty() {
            (String::new(), String::new())
        } else {
            let image = MediaRef::discover(
                MediaKind::Image,
                &id,
                None,
                State::named(RESIZED_STATE),
                self.paths,
            )?;
            let audio = MediaRef::discover(
                MediaKind::Audio,
                &id,
                self.options.media_category.as_deref(),
                State::named(PROCESSED_STATE),
                self.paths,
            )?;
            (media_tag(image.as_ref())?, media_tag(audio.as_ref())?)
        };
        Ok(artist_popup(&img, &name, &birth_line, &audio))
    }

    pub fn render_html(&self) -> Result<String> {
        let map = self.map.as_ref().ok_or(Error::InvalidState {
            operation: "render a map before create_map",
            state: State::Unset,
        })?;
        Ok(MAP_TEMPLATE.replace("__MAP_PAYLOAD__", &script_json(map)?))
    }

    pub fn save_map(&self, path: &Path) -> Result<PathBuf> {
        write_html(path, &self.render_html()?)
    }
}

const MAP_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.css">
<link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.Default.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet.markercluster@1.5.3/dist/leaflet.markercluster.js"></script>
<script src="https://unpkg.com/leaflet.featuregroup.subgroup@1.0.2/dist/leaflet.featuregroup.subgroup.js"></script>
<style>
  html, body { width: 100%; height: 100%; margin: 0; padding: 0; }
  #map { position: absolute; top: 0; bottom: 0; right: 0; left: 0; }
</style>
</head>
<body>
<div id="map"></div>
<script>
  const payload = __MAP_PAYLOAD__;
  const map = L.map("map").setView(payload.center, payload.zoom);
  L.tileLayer("https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png", {
    attribution: "&copy; OpenStreetMap contributors",
    maxZoom: 18
  }).addTo(map);

  const cluster = L.markerClusterGroup();
  map.addLayer(cluster);
  const overlays = {};
  payload.groups.forEach(function (group) {
    const subGroup = L.featureGroup.subGroup(cluster);
    group.markers.forEach(function (marker) {
      const frame = document.createElement("iframe");
      frame.srcdoc = marker.popup;
      frame.width = payload.popup_width;
      frame.height = payload.popup_height;
      frame.style.border = "none";
      L.marker([marker.lat, marker.lng])
        .bindTooltip(marker.tooltip)
        .bindPopup(frame, { maxWidth: payload.popup_width + 50 })
        .addTo(subGroup);
    });
    map.addLayer(subGroup);
    overlays[group.label] = subGroup;
  });
  L.control.layers(null, overlays).addTo(map);
</script>
</body>
</html>
"#;
