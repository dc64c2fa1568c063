/*!
 * The step by step preparation of AIS data, from raw reports to waypoints.
 */

use crate::{
    ais::{AisPoint, ShipType},
    clean::{clean_trips, CleanSummary},
    database::{load_trips, save_trips},
    error::AisError,
    files::{read_ais_folder, read_area_polygon},
    geo::Polygon,
    port::PortList,
    resample::{interpolate, waypoints},
    segment::create_trips,
    trip::{Trip, TripList},
    AisResult,
};
use chrono::Duration;
use log::{log, Level};
use std::{path::Path, time::Instant};

/**
 * Holds the data of every preparation step.
 *
 * Each step reads what earlier steps produced and fails with [AisError::NotDefined] if that is
 * missing. The usual order is:
 *
 * 1. [CleanAis::import_ais], [CleanAis::import_ports], [CleanAis::import_polygon]
 * 2. [CleanAis::create_routes]
 * 3. [CleanAis::remove_routes_outside_polygon]
 * 4. [CleanAis::interpolate_routes]
 * 5. [CleanAis::clean_data]
 * 6. [CleanAis::create_waypoints]
 *
 * Trip sets can be saved after any step and imported again later to skip the earlier steps.
 */
#[derive(Default)]
pub struct CleanAis {
    verbose: bool,
    ais_data: Option<Vec<AisPoint>>,
    ports: Option<PortList>,
    polygon: Option<Polygon>,
    routes: Option<TripList>,
    interpolated: Option<TripList>,
    waypoints: Option<TripList>,
    waypoint_amount: Option<usize>,
}

impl CleanAis {
    /// Create an empty helper. When `verbose` is set, step summaries are logged at info level.
    pub fn new(verbose: bool) -> Self {
        CleanAis {
            verbose,
            ..Self::default()
        }
    }

    fn level(&self) -> Level {
        if self.verbose {
            Level::Info
        } else {
            Level::Debug
        }
    }

    /*---------------------------------------------------------------------------------------------
     *                                        Accessors
     *-------------------------------------------------------------------------------------------*/
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// The imported AIS reports, sorted by vessel and time.
    pub fn ais_data(&self) -> Option<&[AisPoint]> {
        self.ais_data.as_deref()
    }

    pub fn ports(&self) -> Option<&PortList> {
        self.ports.as_ref()
    }

    /// The area the trips have to stay inside.
    pub fn polygon(&self) -> Option<&Polygon> {
        self.polygon.as_ref()
    }

    /// The port to port trips with the raw AIS reports.
    pub fn routes(&self) -> Option<&TripList> {
        self.routes.as_ref()
    }

    /// The trips resampled to a regular time step.
    pub fn interpolated(&self) -> Option<&TripList> {
        self.interpolated.as_ref()
    }

    pub fn waypoints(&self) -> Option<&TripList> {
        self.waypoints.as_ref()
    }

    /// The number of waypoints per trip.
    pub fn waypoint_amount(&self) -> Option<usize> {
        self.waypoint_amount
    }

    /*---------------------------------------------------------------------------------------------
     *                                         Imports
     *-------------------------------------------------------------------------------------------*/
    /// Import the AIS day files of an area and ship type, see [read_ais_folder].
    pub fn import_ais<P: AsRef<Path>>(
        &mut self,
        folder: P,
        area: &str,
        ship_type: ShipType,
        file_amount: Option<usize>,
    ) -> AisResult<()> {
        let start = Instant::now();

        let points = read_ais_folder(folder, area, ship_type, file_amount)?;
        log!(
            self.level(),
            "Imported {} AIS reports ({:.2}s)",
            points.len(),
            start.elapsed().as_secs_f64()
        );

        self.ais_data = Some(points);
        Ok(())
    }

    /// Import the port polygons.
    pub fn import_ports<P: AsRef<Path>>(&mut self, path: P) -> AisResult<()> {
        let start = Instant::now();

        let ports = PortList::from_file(path)?;
        log!(
            self.level(),
            "Imported {} port polygons ({:.2}s)",
            ports.len(),
            start.elapsed().as_secs_f64()
        );

        self.ports = Some(ports);
        Ok(())
    }

    /// Import the polygon of the area of interest.
    pub fn import_polygon<P: AsRef<Path>>(&mut self, path: P) -> AisResult<()> {
        let start = Instant::now();

        let polygon = read_area_polygon(path)?;
        log!(
            self.level(),
            "Imported polygon of geoarea with {} vertices ({:.2}s)",
            polygon.len(),
            start.elapsed().as_secs_f64()
        );

        self.polygon = Some(polygon);
        Ok(())
    }

    /*---------------------------------------------------------------------------------------------
     *                                          Steps
     *-------------------------------------------------------------------------------------------*/
    /// Cut the AIS reports into port to port trips, see [create_trips].
    pub fn create_routes(&mut self, speed_limit: f64, min_points: usize) -> AisResult<()> {
        let ais_data = self
            .ais_data
            .as_ref()
            .ok_or(AisError::NotDefined("ais_data"))?;
        let ports = self.ports.as_ref().ok_or(AisError::NotDefined("ports"))?;

        let start = Instant::now();
        let routes = create_trips(ais_data, ports, speed_limit, min_points)?;
        log!(
            self.level(),
            "Done setting up {} routes with {} points ({:.2}s)",
            routes.len(),
            routes.num_points(),
            start.elapsed().as_secs_f64()
        );

        self.routes = Some(routes);
        Ok(())
    }

    /// Remove every trip that leaves the area polygon.
    ///
    /// Returns the number of trips removed.
    pub fn remove_routes_outside_polygon(&mut self) -> AisResult<usize> {
        let polygon = self.polygon.as_ref().ok_or(AisError::NotDefined("polygon"))?;
        let routes = self.routes.as_mut().ok_or(AisError::NotDefined("routes"))?;

        let start = Instant::now();
        let removed = routes.retain(|trip| trip.points.iter().all(|p| polygon.contains(p.coord())));

        let level = self.level();
        log!(
            level,
            "Removed {} routes outside the polygon ({:.2}s)",
            removed,
            start.elapsed().as_secs_f64()
        );

        Ok(removed)
    }

    /// Resample every trip to a time step of `interval_s` seconds, see [interpolate].
    pub fn interpolate_routes(&mut self, interval_s: i64) -> AisResult<()> {
        let routes = self.routes.as_ref().ok_or(AisError::NotDefined("routes"))?;

        let start = Instant::now();
        let interpolated = routes
            .iter()
            .map(|trip| interpolate(trip, interval_s))
            .collect::<AisResult<Vec<Trip>>>()?;
        let interpolated = TripList::from(interpolated);

        log!(
            self.level(),
            "Interpolated {} routes to {} points ({:.2}s)",
            interpolated.len(),
            interpolated.num_points(),
            start.elapsed().as_secs_f64()
        );

        self.interpolated = Some(interpolated);
        Ok(())
    }

    /// Remove idle and slow trips from the raw and interpolated trips, see [clean_trips].
    pub fn clean_data(
        &mut self,
        threshold_km: f64,
        interval_s: i64,
        speed: f64,
    ) -> AisResult<CleanSummary> {
        let level = self.level();
        let routes = self.routes.as_mut().ok_or(AisError::NotDefined("routes"))?;
        let interpolated = self
            .interpolated
            .as_mut()
            .ok_or(AisError::NotDefined("interpolated_routes"))?;

        let start = Instant::now();
        let summary = clean_trips(routes, interpolated, threshold_km, interval_s, speed)?;
        log!(
            level,
            "Cleaned data, removed {} idle and {} slow routes, {} remain ({:.2}s)",
            summary.idle,
            summary.slow,
            interpolated.len(),
            start.elapsed().as_secs_f64()
        );

        Ok(summary)
    }

    /**
     * Reduce every interpolated trip to exactly `count` waypoints, see [waypoints].
     *
     * Trips that took less than `min_duration` are left out. The duration is taken from the raw
     * trip when it is available.
     */
    pub fn create_waypoints(&mut self, count: usize, min_duration: Duration) -> AisResult<()> {
        if count < 2 {
            return Err(AisError::WrongArguments(format!(
                "at least 2 waypoints are needed, but {} were requested",
                count
            ))
            .into());
        }

        let interpolated = self
            .interpolated
            .as_ref()
            .ok_or(AisError::NotDefined("interpolated_routes"))?;

        let start = Instant::now();
        let mut result = TripList::new();
        let mut too_short = 0;
        for trip in interpolated.iter() {
            let duration = self
                .routes
                .as_ref()
                .and_then(|routes| routes.get(trip.id))
                .map(Trip::duration)
                .unwrap_or_else(|| trip.duration());

            if duration < min_duration {
                too_short += 1;
                continue;
            }

            match waypoints(trip, count)? {
                Some(wp) => result.add_trip(wp),
                None => too_short += 1,
            }
        }

        log!(
            self.level(),
            "Created waypoints for {} routes, {} were too short ({:.2}s)",
            result.len(),
            too_short,
            start.elapsed().as_secs_f64()
        );

        self.waypoints = Some(result);
        self.waypoint_amount = Some(count);
        Ok(())
    }

    /*---------------------------------------------------------------------------------------------
     *                                        Snapshots
     *-------------------------------------------------------------------------------------------*/
    fn save_snapshot(
        &self,
        trips: Option<&TripList>,
        name: &'static str,
        path: &Path,
    ) -> AisResult<()> {
        let trips = trips.ok_or(AisError::NotDefined(name))?;

        let start = Instant::now();
        save_trips(path, trips)?;
        log!(
            self.level(),
            "Saved {} ({:.2}s)",
            name,
            start.elapsed().as_secs_f64()
        );

        Ok(())
    }

    fn import_snapshot(&self, name: &'static str, path: &Path) -> AisResult<TripList> {
        let start = Instant::now();
        let trips = load_trips(path)?;
        log!(
            self.level(),
            "Imported {} {} from {} ({:.2}s)",
            trips.len(),
            name,
            path.display(),
            start.elapsed().as_secs_f64()
        );

        Ok(trips)
    }

    pub fn save_routes<P: AsRef<Path>>(&self, path: P) -> AisResult<()> {
        self.save_snapshot(self.routes.as_ref(), "routes", path.as_ref())
    }

    pub fn save_interpolated<P: AsRef<Path>>(&self, path: P) -> AisResult<()> {
        self.save_snapshot(
            self.interpolated.as_ref(),
            "interpolated_routes",
            path.as_ref(),
        )
    }

    pub fn save_waypoints<P: AsRef<Path>>(&self, path: P) -> AisResult<()> {
        self.save_snapshot(self.waypoints.as_ref(), "waypoints", path.as_ref())
    }

    pub fn import_routes<P: AsRef<Path>>(&mut self, path: P) -> AisResult<()> {
        self.routes = Some(self.import_snapshot("routes", path.as_ref())?);
        Ok(())
    }

    pub fn import_interpolated<P: AsRef<Path>>(&mut self, path: P) -> AisResult<()> {
        self.interpolated = Some(self.import_snapshot("interpolated_routes", path.as_ref())?);
        Ok(())
    }

    /// Import waypoints, the waypoint amount is taken from the imported trips.
    pub fn import_waypoints<P: AsRef<Path>>(&mut self, path: P) -> AisResult<()> {
        let trips = self.import_snapshot("waypoints", path.as_ref())?;
        self.waypoint_amount = trips.iter().next().map(Trip::len);
        self.waypoints = Some(trips);
        Ok(())
    }
}
