//! Snapshots of trip sets stored in SQLite files.
//!
//! A snapshot holds one trip set, the raw trips, the interpolated trips, or the waypoints. Saving
//! replaces whatever the file held before.

use crate::{
    ais::AisPoint,
    error::AisError,
    geo::Coord,
    trip::{PortCall, Trip, TripList},
    AisResult,
};
use chrono::NaiveDateTime;
use log::debug;
use rusqlite::{Connection, OpenFlags, ToSql};
use rustc_hash::FxHashMap as HashMap;
use std::path::Path;

fn open_database_to_write(path: &Path) -> AisResult<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
    )?;

    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    const QUERY: &str = include_str!("database/create_snapshot_db.sql");
    conn.execute_batch(QUERY)?;

    Ok(conn)
}

fn open_database_to_read(path: &Path) -> AisResult<Connection> {
    if !path.is_file() {
        return Err(AisError::Path(path.to_path_buf()).into());
    }

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;

    Ok(conn)
}

/// Save a trip set, replacing the previous content of the snapshot.
pub fn save_trips<P: AsRef<Path>>(path: P, trips: &TripList) -> AisResult<()> {
    let path = path.as_ref();
    let conn = open_database_to_write(path)?;

    conn.execute("BEGIN TRANSACTION", [])?;
    conn.execute("DELETE FROM points", [])?;
    conn.execute("DELETE FROM trips", [])?;

    {
        let mut add_trip = conn.prepare(include_str!("database/add_trip.sql"))?;
        let mut add_point = conn.prepare(include_str!("database/add_point.sql"))?;

        for trip in trips.iter() {
            let id = i64::try_from(trip.id)?;

            add_trip.execute([
                &id as &dyn ToSql,
                &trip.mmsi,
                &trip.from.locode,
                &trip.from.name,
                &trip.from.position.lat,
                &trip.from.position.lon,
                &trip.to.locode,
                &trip.to.name,
                &trip.to.position.lat,
                &trip.to.position.lon,
                &trip.arrival,
            ])?;

            for (seq, p) in trip.points.iter().enumerate() {
                let seq = seq as i64;
                add_point.execute([
                    &id as &dyn ToSql,
                    &seq,
                    &p.time,
                    &p.lat,
                    &p.lon,
                    &p.sog,
                    &p.cog,
                ])?;
            }
        }
    }

    conn.execute("COMMIT", [])?;

    debug!(
        "Saved {} trips with {} points to {}",
        trips.len(),
        trips.num_points(),
        path.display()
    );

    Ok(())
}

/// trip id, time, lat, lon, sog, cog
type PointRow = (u64, NaiveDateTime, f64, f64, Option<f64>, Option<f64>);

fn port_call(row: &rusqlite::Row, first_column: usize) -> rusqlite::Result<PortCall> {
    Ok(PortCall {
        locode: row.get(first_column)?,
        name: row.get(first_column + 1)?,
        position: Coord {
            lat: row.get(first_column + 2)?,
            lon: row.get(first_column + 3)?,
        },
    })
}

/// Load a trip set saved with [save_trips], in id order.
pub fn load_trips<P: AsRef<Path>>(path: P) -> AisResult<TripList> {
    let path = path.as_ref();
    let conn = open_database_to_read(path)?;

    let mut trips: Vec<Trip> = vec![];
    let mut index: HashMap<u64, usize> = HashMap::default();

    let mut stmt = conn.prepare(include_str!("database/query_trips.sql"))?;
    let rows = stmt.query_and_then([], |row| -> AisResult<Trip> {
        let id: u64 = u64::try_from(row.get::<_, i64>(0)?)?;

        Ok(Trip {
            id,
            mmsi: row.get(1)?,
            from: port_call(row, 2)?,
            to: port_call(row, 6)?,
            arrival: row.get(10)?,
            points: vec![],
        })
    })?;

    for trip in rows {
        let trip = trip?;
        index.insert(trip.id, trips.len());
        trips.push(trip);
    }

    let mut stmt = conn.prepare(include_str!("database/query_points.sql"))?;
    let rows = stmt.query_and_then([], |row| -> AisResult<PointRow> {
        Ok((
            u64::try_from(row.get::<_, i64>(0)?)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    })?;

    for row in rows {
        let (trip_id, time, lat, lon, sog, cog) = row?;

        let trip = match index.get(&trip_id) {
            Some(&i) => &mut trips[i],
            None => continue,
        };

        trip.points.push(AisPoint {
            mmsi: trip.mmsi,
            time,
            lat,
            lon,
            sog,
            cog,
        });
    }

    debug!("Loaded {} trips from {}", trips.len(), path.display());

    Ok(TripList::from(trips))
}
