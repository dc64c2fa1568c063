use crate::{
    ais::AisPoint,
    geo::{BoundingBox, Coord, Geo},
    kml::{KmlFile, KmlWriter, KmzFile},
    AisResult,
};
use chrono::{Duration, NaiveDateTime};
use rustc_hash::FxHashSet as HashSet;
use std::{
    fmt::{self, Display, Write},
    path::Path,
};

/// A port where a vessel stayed at the start or the end of a trip.
#[derive(Debug, Clone, PartialEq)]
pub struct PortCall {
    /// UN/LOCODE of the port.
    pub locode: String,
    pub name: String,
    /// Centroid of the port polygon.
    pub position: Coord,
}

/**
 * The track of a vessel between two port stays.
 *
 * The points are in time order. Depending on the step that produced it they are the raw AIS
 * reports, a resampling at a fixed time step, or a fixed number of waypoints.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: u64,
    pub mmsi: u32,
    pub from: PortCall,
    pub to: PortCall,
    /// Time the vessel was first seen in the destination port.
    pub arrival: NaiveDateTime,
    pub points: Vec<AisPoint>,
}

impl Trip {
    /// Time of the first point on the track.
    pub fn departure(&self) -> Option<NaiveDateTime> {
        self.points.first().map(|p| p.time)
    }

    /// Time between the first and last point on the track.
    pub fn duration(&self) -> Duration {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => Duration::zero(),
        }
    }

    /// Number of points on the track.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Copy the metadata of this trip onto a new set of points.
    pub fn with_points(&self, points: Vec<AisPoint>) -> Self {
        Trip {
            id: self.id,
            mmsi: self.mmsi,
            from: self.from.clone(),
            to: self.to.clone(),
            arrival: self.arrival,
            points,
        }
    }

    /// Format the duration in an easy to read way.
    pub fn format_duration(&self, buffer: &mut String) {
        buffer.clear();
        let duration = self.duration();

        let days = duration.num_days();
        if days > 0 {
            let _ = write!(buffer, "{} days ", days);
        }

        let hours = duration.num_hours() % 24;
        let minutes = duration.num_minutes() % 60;
        let _ = write!(buffer, "{} hours {} minutes", hours, minutes);
    }
}

impl Display for Trip {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let mut duration_buf = String::with_capacity(64);
        self.format_duration(&mut duration_buf);

        writeln!(f, "       ID: {:9}", self.id)?;
        writeln!(f, "     MMSI: {:9}", self.mmsi)?;
        writeln!(f, "     From: {} ({})", self.from.locode, self.from.name)?;
        writeln!(f, "       To: {} ({})", self.to.locode, self.to.name)?;
        match self.departure() {
            Some(dep) => writeln!(f, "Departure: {}", dep)?,
            None => writeln!(f, "Departure: -")?,
        }
        writeln!(f, "  Arrival: {}", self.arrival)?;
        writeln!(f, " Duration: {}", duration_buf)?;
        writeln!(f, "   Points: {}", self.points.len())
    }
}

impl Geo for Trip {
    fn centroid(&self) -> Coord {
        self.bounding_box().center()
    }

    fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for p in &self.points {
            bbox.expand_to(p.coord());
        }
        bbox
    }
}

/// A list of [Trip] objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripList(Vec<Trip>);

impl From<Vec<Trip>> for TripList {
    fn from(src: Vec<Trip>) -> Self {
        TripList(src)
    }
}

impl TripList {
    /// Create a new, empty list.
    pub fn new() -> Self {
        TripList(vec![])
    }

    /// Get a vector of trips.
    pub fn into_vec(self) -> Vec<Trip> {
        self.0
    }

    /// Add a trip to the list.
    pub fn add_trip(&mut self, trip: Trip) {
        self.0.push(trip)
    }

    /// Get the number of trips in the list.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if this list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of points in all trips.
    pub fn num_points(&self) -> usize {
        self.0.iter().map(Trip::len).sum()
    }

    /// Get an iterator over the trips.
    pub fn iter(&self) -> impl Iterator<Item = &Trip> {
        self.0.iter()
    }

    /// Find a trip by id.
    pub fn get(&self, id: u64) -> Option<&Trip> {
        self.0.iter().find(|t| t.id == id)
    }

    /// The ids of all trips in the list.
    pub fn ids(&self) -> HashSet<u64> {
        self.0.iter().map(|t| t.id).collect()
    }

    /// Keep only the trips for which the predicate holds.
    ///
    /// Returns the number of trips removed.
    pub fn retain<F: FnMut(&Trip) -> bool>(&mut self, f: F) -> usize {
        let starting_size = self.0.len();
        self.0.retain(f);
        starting_size - self.0.len()
    }

    /// Keep only the trips with an id in `ids`.
    ///
    /// Returns the number of trips removed.
    pub fn retain_ids(&mut self, ids: &HashSet<u64>) -> usize {
        self.retain(|t| ids.contains(&t.id))
    }

    /// Remove the trips with an id in `ids`.
    ///
    /// Returns the number of trips removed.
    pub fn remove_ids(&mut self, ids: &HashSet<u64>) -> usize {
        self.retain(|t| !ids.contains(&t.id))
    }

    /// Save this list in a KML file.
    pub fn save_kml<P: AsRef<Path>>(&self, kml_path: P) -> AisResult<()> {
        let mut kml = KmlFile::new(kml_path)?;
        self.kml_write(&mut kml)
    }

    /// Save this list in a KMZ file.
    pub fn save_kmz<P: AsRef<Path>>(&self, kmz_path: P) -> AisResult<()> {
        let mut kmz = KmzFile::new(kmz_path)?;
        self.kml_write(&mut kmz)?;
        kmz.finish()
    }

    fn kml_write<K: KmlWriter>(&self, kml: &mut K) -> AisResult<()> {
        kml.track_style("track", "ff0080ff", 2.0)?;
        kml.port_style(
            "port",
            "http://maps.google.com/mapfiles/kml/shapes/anchor.png",
        )?;

        let mut name = String::with_capacity(32);
        let mut description = String::with_capacity(256);
        let mut duration_buf = String::with_capacity(64);
        for trip in self.iter().filter(|t| !t.is_empty()) {
            name.clear();
            let _ = write!(
                &mut name,
                "{} {} - {}",
                trip.mmsi, trip.from.locode, trip.to.locode
            );

            kml.start_folder(&name)?;

            trip.format_duration(&mut duration_buf);

            description.clear();
            let _ = write!(
                &mut description,
                concat!(
                    "ID: {}<br/>",
                    "MMSI: {}<br/>",
                    "From: {} ({})<br/>",
                    "To: {} ({})<br/>",
                    "Arrival: {}<br/>",
                    "Duration: {}<br/>",
                    "Points: {}<br/>",
                ),
                trip.id,
                trip.mmsi,
                trip.from.locode,
                trip.from.name,
                trip.to.locode,
                trip.to.name,
                trip.arrival,
                duration_buf,
                trip.points.len(),
            );

            kml.start_placemark(&name, &description, "track")?;
            if let (Some(start), Some(end)) = (trip.points.first(), trip.points.last()) {
                kml.timespan(start.time, end.time)?;
            }
            kml.track(&trip.points)?;
            kml.finish_placemark()?;

            for call in [&trip.from, &trip.to] {
                kml.start_placemark(&call.locode, &call.name, "port")?;
                kml.point(call.position)?;
                kml.finish_placemark()?;
            }

            kml.finish_folder()?;
        }

        Ok(())
    }
}
