/*!
 * Cutting vessel tracks into port to port trips.
 *
 * A vessel is considered to have stayed in a port when it moved slowly enough while inside the
 * port polygon. Everything it reported between two such stays is one trip.
 */

use crate::{
    ais::{AisPoint, KNOTS_PER_KMH},
    error::AisError,
    port::PortList,
    trip::{Trip, TripList},
    AisResult,
};
use log::debug;

/// A run of consecutive reports from one vessel inside one port, or outside all ports.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Run {
    /// The vessel docked, `start` is the index of its first report in the port.
    Stay { port: usize, start: usize },
    /// Reports that belong on a track, `start..end` index into the vessel's reports.
    Track { start: usize, end: usize },
}

/// Mean speed in knots between the first and last report of a port visit.
///
/// A visit without elapsed time has no speed.
fn visit_speed(first: &AisPoint, last: &AisPoint) -> Option<f64> {
    let seconds = (last.time - first.time).num_milliseconds() as f64 / 1000.0;
    if seconds <= 0.0 {
        return None;
    }

    let km = first.distance_km(last);
    Some(km / (seconds / 3600.0) * KNOTS_PER_KMH)
}

/// Split the reports of a single vessel into stays and track runs.
fn vessel_runs(points: &[AisPoint], ports: &PortList, speed_limit: f64) -> Vec<Run> {
    let tags: Vec<Option<usize>> = points.iter().map(|p| ports.locate(p.coord())).collect();

    let mut runs: Vec<Run> = vec![];
    let mut start = 0;
    while start < points.len() {
        let tag = tags[start];
        let mut end = start + 1;
        while end < points.len() && tags[end] == tag {
            end += 1;
        }

        let is_stay = match tag {
            Some(_) => visit_speed(&points[start], &points[end - 1])
                .map(|kn| kn <= speed_limit)
                .unwrap_or(false),
            None => false,
        };

        match (tag, is_stay) {
            (Some(port), true) => runs.push(Run::Stay { port, start }),
            // Passages through a port stay on the track.
            _ => match runs.last_mut() {
                Some(Run::Track { end: prev_end, .. }) => *prev_end = end,
                _ => runs.push(Run::Track { start, end }),
            },
        }

        start = end;
    }

    runs
}

/**
 * Find the trips vessels made between ports.
 *
 * # Arguments
 * points - the AIS reports, in any order.
 * ports - the known ports.
 * speed_limit - a port visit with a mean speed (knots) at or below this is a stay.
 * min_points - trips with fewer reports than this are dropped.
 *
 * # Returns
 * The trips, with ids assigned in vessel and departure order. Reports before the first stay
 * and after the last stay of a vessel are not part of any trip.
 */
pub fn create_trips(
    points: &[AisPoint],
    ports: &PortList,
    speed_limit: f64,
    min_points: usize,
) -> AisResult<TripList> {
    if !speed_limit.is_finite() || speed_limit < 0.0 {
        return Err(AisError::WrongArguments(format!(
            "speed_limit must be a non-negative number, but was {}",
            speed_limit
        ))
        .into());
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.mmsi.cmp(&b.mmsi).then(a.time.cmp(&b.time)));

    let mut trips = TripList::new();
    let mut next_id = 0;
    let mut too_short = 0;

    for vessel in sorted.chunk_by(|a, b| a.mmsi == b.mmsi) {
        let runs = vessel_runs(vessel, ports, speed_limit);

        for window in runs.windows(3) {
            if let [Run::Stay { port: from, .. }, Run::Track { start, end }, Run::Stay { port: to, start: arrival }] =
                *window
            {
                if end - start < min_points {
                    too_short += 1;
                    continue;
                }

                // Indexes come from locate() on this list, so they are valid.
                let (from, to) = match (ports.get(from), ports.get(to)) {
                    (Some(from), Some(to)) => (from, to),
                    _ => continue,
                };

                trips.add_trip(Trip {
                    id: next_id,
                    mmsi: vessel[0].mmsi,
                    from: from.port_call(),
                    to: to.port_call(),
                    arrival: vessel[arrival].time,
                    points: vessel[start..end].to_vec(),
                });
                next_id += 1;
            }
        }
    }

    debug!(
        "Created {} trips, dropped {} with fewer than {} points.",
        trips.len(),
        too_short,
        min_points
    );

    Ok(trips)
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    // Two square ports 1 degree apart in longitude.
    const PORTS: &str = concat!(
        "Alpha;XXALP;10.0 55.0,10.2 55.0,10.2 55.2,10.0 55.2\n",
        "Bravo;XXBRV;11.0 55.0,11.2 55.0,11.2 55.2,11.0 55.2\n",
    );

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 4, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn point(mmsi: u32, minutes: i64, lat: f64, lon: f64) -> AisPoint {
        AisPoint {
            mmsi,
            time: t0() + Duration::minutes(minutes),
            lat,
            lon,
            sog: Some(10.0),
            cog: Some(90.0),
        }
    }

    /// Stay in Alpha, sail to Bravo with `n` reports, stay in Bravo.
    fn alpha_to_bravo(mmsi: u32, n: usize) -> Vec<AisPoint> {
        let mut pts = vec![];
        // Docked: barely moving over an hour.
        pts.push(point(mmsi, 0, 55.1, 10.1));
        pts.push(point(mmsi, 60, 55.1, 10.1001));

        for i in 0..n {
            let lon = 10.3 + 0.6 * i as f64 / n as f64;
            pts.push(point(mmsi, 70 + 10 * i as i64, 55.1, lon));
        }

        let arrive = 70 + 10 * n as i64;
        pts.push(point(mmsi, arrive, 55.1, 11.1));
        pts.push(point(mmsi, arrive + 120, 55.1, 11.1001));
        pts
    }

    #[test]
    fn test_single_trip() {
        let ports = PortList::from_reader(PORTS.as_bytes()).unwrap();
        let pts = alpha_to_bravo(1, 12);

        let trips = create_trips(&pts, &ports, 3.0, 10).unwrap();
        assert_eq!(trips.len(), 1);

        let trip = trips.get(0).unwrap();
        assert_eq!(trip.mmsi, 1);
        assert_eq!(trip.from.locode, "XXALP");
        assert_eq!(trip.to.locode, "XXBRV");
        assert_eq!(trip.len(), 12);
        assert_eq!(trip.arrival, t0() + Duration::minutes(70 + 120));
        assert!(trip.points.iter().all(|p| p.lon > 10.2 && p.lon < 11.0));
    }

    #[test]
    fn test_short_trips_are_dropped() {
        let ports = PortList::from_reader(PORTS.as_bytes()).unwrap();
        let pts = alpha_to_bravo(1, 5);

        let trips = create_trips(&pts, &ports, 3.0, 10).unwrap();
        assert!(trips.is_empty());

        let trips = create_trips(&pts, &ports, 3.0, 5).unwrap();
        assert_eq!(trips.len(), 1);
    }

    #[test]
    fn test_unbounded_runs_are_not_trips() {
        let ports = PortList::from_reader(PORTS.as_bytes()).unwrap();

        // Sailing before the first stay and after the last.
        let mut pts = vec![];
        for i in 0..15 {
            pts.push(point(7, i, 56.0, 9.0 + 0.01 * i as f64));
        }
        let offset = 100;
        for mut p in alpha_to_bravo(7, 12) {
            p.time += Duration::minutes(offset);
            pts.push(p);
        }
        for i in 0..15 {
            pts.push(point(7, 1000 + i, 56.0, 12.0 + 0.01 * i as f64));
        }

        let trips = create_trips(&pts, &ports, 3.0, 10).unwrap();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips.get(0).unwrap().len(), 12);
    }

    #[test]
    fn test_fast_port_passage_stays_on_track() {
        let ports = PortList::from_reader(PORTS.as_bytes()).unwrap();

        let mut pts = alpha_to_bravo(3, 12);
        // Replace the stay in Bravo with a quick passage and add a stay in Alpha later.
        let n = pts.len();
        pts[n - 1] = point(3, 70 + 10 * 12 + 10, 55.1, 11.19);
        for i in 0..12 {
            pts.push(point(3, 300 + 10 * i, 55.1, 10.95 - 0.05 * i as f64));
        }
        pts.push(point(3, 500, 55.1, 10.1));
        pts.push(point(3, 600, 55.1, 10.1));

        let trips = create_trips(&pts, &ports, 3.0, 10).unwrap();
        assert_eq!(trips.len(), 1);

        let trip = trips.get(0).unwrap();
        assert_eq!(trip.from.locode, "XXALP");
        assert_eq!(trip.to.locode, "XXALP");
        // 12 out, 2 in Bravo, 12 back.
        assert_eq!(trip.len(), 26);
    }

    #[test]
    fn test_single_report_in_port_stays_on_track() {
        let ports = PortList::from_reader(PORTS.as_bytes()).unwrap();

        let mut pts = vec![point(5, 0, 55.1, 10.1), point(5, 60, 55.1, 10.1001)];
        // Leaving along the east edge of Alpha, which is not inside it.
        pts.push(point(5, 70, 55.1, 10.2));
        for i in 0..5 {
            pts.push(point(5, 80 + 10 * i, 55.1, 10.3 + 0.15 * i as f64));
        }
        // One report in Bravo, no elapsed time to measure a speed.
        pts.push(point(5, 130, 55.1, 11.1));
        for i in 0..6 {
            pts.push(point(5, 140 + 10 * i, 55.1, 10.9 - 0.12 * i as f64));
        }
        pts.push(point(5, 300, 55.1, 10.1));
        pts.push(point(5, 400, 55.1, 10.1));

        let trips = create_trips(&pts, &ports, 3.0, 10).unwrap();
        assert_eq!(trips.len(), 1);

        let trip = trips.get(0).unwrap();
        assert_eq!(trip.from.locode, "XXALP");
        assert_eq!(trip.to.locode, "XXALP");
        assert_eq!(trip.arrival, t0() + Duration::minutes(300));
        assert_eq!(trip.len(), 13);
        assert!(trip.points.iter().any(|p| p.lon == 11.1));
        assert_eq!(trip.points[0].lon, 10.2);
    }

    #[test]
    fn test_ids_follow_vessel_order() {
        let ports = PortList::from_reader(PORTS.as_bytes()).unwrap();

        let mut pts = alpha_to_bravo(20, 12);
        pts.extend(alpha_to_bravo(10, 12));
        pts.reverse();

        let trips = create_trips(&pts, &ports, 3.0, 10).unwrap();
        let mmsis: Vec<(u64, u32)> = trips.iter().map(|t| (t.id, t.mmsi)).collect();
        assert_eq!(mmsis, vec![(0, 10), (1, 20)]);
    }

    #[test]
    fn test_bad_speed_limit() {
        let ports = PortList::from_reader(PORTS.as_bytes()).unwrap();
        assert!(create_trips(&[], &ports, -1.0, 10).is_err());
        assert!(create_trips(&[], &ports, 3.0, 10).unwrap().is_empty());
    }
}
