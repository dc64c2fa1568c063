pub use ais::{AisPoint, ShipType, KNOTS_PER_KMH};
pub use clean::{clean_trips, CleanSummary};
pub use database::{load_trips, save_trips};
pub use error::AisError;
pub use files::{
    check_path, list_files, read_ais_file, read_ais_folder, read_area_polygon, write_ais_file,
    write_area_polygon,
};
pub use geo::{great_circle_distance, BoundingBox, Coord, Geo, PackedRTree, Polygon};
pub use kml::{KmlFile, KmlWriter, KmzFile};
pub use pipeline::CleanAis;
pub use port::{Port, PortList};
pub use resample::{interpolate, waypoints};
pub use segment::create_trips;
pub use source::{
    date_range, download_ais, download_area, parse_date, AisSource, DatabaseConfig,
    PostgresSource,
};
pub use trip::{PortCall, Trip, TripList};

/// Result type used throughout the library.
pub type AisResult<T> = Result<T, Box<dyn std::error::Error>>;

/**************************************************************************************************
 * Private Implementation
 *************************************************************************************************/
mod ais;
mod clean;
mod database;
mod error;
mod files;
mod geo;
mod kml;
mod pipeline;
mod port;
mod resample;
mod segment;
mod source;
mod trip;
