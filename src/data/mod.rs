pub mod columns;
pub mod dataset;
pub mod geocode;
pub mod gold;
pub mod loader;
pub mod registry;
pub mod table;

pub use dataset::{Dataset, DatasetKind, RawLoader, State};
pub use geocode::{add_new_places, Coordinates, Geocoder, GoogleGeocoder};
pub use gold::GoldDataBuilder;
pub use loader::{load_raw_data, FileType, LoaderOptions};
pub use registry::{DatasetConfig, Registry};
pub use table::{Table, Value};
