/*!
 * Resampling trips in time.
 *
 * [interpolate] puts a trip on a regular time grid, [waypoints] reduces a trip to a fixed number
 * of evenly spaced points.
 */

use crate::{ais::AisPoint, error::AisError, trip::Trip, AisResult};
use chrono::{Duration, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;

/// Linear interpolation between `a` and `b`.
fn lerp(a: f64, b: f64, frac: f64) -> f64 {
    a + (b - a) * frac
}

/// Interpolate a course in degrees along the shorter arc between `a` and `b`.
fn lerp_course(a: f64, b: f64, frac: f64) -> f64 {
    let delta = (b - a + 540.0).rem_euclid(360.0) - 180.0;
    (a + delta * frac).rem_euclid(360.0)
}

/// Interpolate two optional values, falling back to whichever one is known.
fn lerp_optional(a: Option<f64>, b: Option<f64>, frac: f64, f: fn(f64, f64, f64) -> f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b, frac)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Fill the interior gaps of a column by linear interpolation over the position in the column.
///
/// Leading and trailing gaps are left alone.
fn fill_gaps(values: &mut [Option<f64>], f: fn(f64, f64, f64) -> f64) {
    let mut prev: Option<usize> = None;

    for i in 0..values.len() {
        if values[i].is_none() {
            continue;
        }

        if let Some(p) = prev {
            if i - p > 1 {
                let (a, b) = (values[p].unwrap_or_default(), values[i].unwrap_or_default());
                let span = (i - p) as f64;
                for (k, item) in values.iter_mut().enumerate().take(i).skip(p + 1) {
                    *item = Some(f(a, b, (k - p) as f64 / span));
                }
            }
        }
        prev = Some(i);
    }
}

/// Running sums of the reports that fall into one time bin.
#[derive(Debug, Default, Clone, Copy)]
struct Bin {
    count: u32,
    lat: f64,
    lon: f64,
    sog_count: u32,
    sog: f64,
    cog_count: u32,
    cog_sin: f64,
    cog_cos: f64,
}

impl Bin {
    fn add(&mut self, p: &AisPoint) {
        self.count += 1;
        self.lat += p.lat;
        self.lon += p.lon;

        if let Some(sog) = p.sog {
            self.sog_count += 1;
            self.sog += sog;
        }

        if let Some(cog) = p.cog {
            self.cog_count += 1;
            self.cog_sin += cog.to_radians().sin();
            self.cog_cos += cog.to_radians().cos();
        }
    }

    fn mean_sog(&self) -> Option<f64> {
        (self.sog_count > 0).then(|| self.sog / f64::from(self.sog_count))
    }

    /// Circular mean of the course, undefined if the courses cancel out.
    fn mean_cog(&self) -> Option<f64> {
        if self.cog_count == 0 || (self.cog_sin.abs() < 1.0e-12 && self.cog_cos.abs() < 1.0e-12) {
            return None;
        }

        Some(self.cog_sin.atan2(self.cog_cos).to_degrees().rem_euclid(360.0))
    }
}

/**
 * Resample a trip onto a regular time grid.
 *
 * The grid starts at midnight of the day of the first report and has a step of `interval_s`
 * seconds. Each grid cell with reports gets their mean position and speed and the circular mean
 * of their course, labelled with the start of the cell. Empty cells between the first and last
 * report are filled by linear interpolation.
 */
pub fn interpolate(trip: &Trip, interval_s: i64) -> AisResult<Trip> {
    if interval_s <= 0 {
        return Err(AisError::WrongArguments(format!(
            "interpolation interval must be positive, but was {} s",
            interval_s
        ))
        .into());
    }

    let first = match trip.points.first() {
        Some(p) => p,
        None => return Ok(trip.with_points(vec![])),
    };

    let origin: NaiveDateTime = first.time.date().and_time(NaiveTime::MIN);

    let mut bins: BTreeMap<i64, Bin> = BTreeMap::new();
    for p in &trip.points {
        let seconds = (p.time - origin).num_seconds();
        bins.entry(seconds.div_euclid(interval_s))
            .or_default()
            .add(p);
    }

    let (first_bin, last_bin) = match (bins.keys().next(), bins.keys().next_back()) {
        (Some(&f), Some(&l)) => (f, l),
        _ => return Ok(trip.with_points(vec![])),
    };

    let num_bins = (last_bin - first_bin + 1) as usize;
    let mut lats = vec![None; num_bins];
    let mut lons = vec![None; num_bins];
    let mut sogs = vec![None; num_bins];
    let mut cogs = vec![None; num_bins];

    for (&b, bin) in &bins {
        let i = (b - first_bin) as usize;
        let n = f64::from(bin.count);
        lats[i] = Some(bin.lat / n);
        lons[i] = Some(bin.lon / n);
        sogs[i] = bin.mean_sog();
        cogs[i] = bin.mean_cog();
    }

    fill_gaps(&mut lats, lerp);
    fill_gaps(&mut lons, lerp);
    fill_gaps(&mut sogs, lerp);
    fill_gaps(&mut cogs, lerp_course);

    let points = (0..num_bins)
        .filter_map(|i| {
            let time = origin + Duration::seconds((first_bin + i as i64) * interval_s);
            Some(AisPoint {
                mmsi: trip.mmsi,
                time,
                lat: lats[i]?,
                lon: lons[i]?,
                sog: sogs[i],
                cog: cogs[i],
            })
        })
        .collect();

    Ok(trip.with_points(points))
}

/**
 * Reduce a trip to exactly `count` waypoints.
 *
 * The waypoints are at evenly spaced times from the first to the last report, with positions
 * interpolated linearly between the reports around them.
 *
 * # Returns
 * `None` if the trip has no extent in time to spread the waypoints over.
 */
pub fn waypoints(trip: &Trip, count: usize) -> AisResult<Option<Trip>> {
    if count < 2 {
        return Err(AisError::WrongArguments(format!(
            "at least 2 waypoints are needed, but {} were requested",
            count
        ))
        .into());
    }

    let (first, last) = match (trip.points.first(), trip.points.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Ok(None),
    };

    let total_ms = (last.time - first.time).num_milliseconds();
    if total_ms <= 0 {
        return Ok(None);
    }

    let mut out = Vec::with_capacity(count);
    let mut seg = 0;
    for i in 0..count {
        let offset_ms = total_ms * i as i64 / (count - 1) as i64;
        let time = first.time + Duration::milliseconds(offset_ms);

        // Advance to the segment that brackets this time.
        while seg + 2 < trip.points.len() && trip.points[seg + 1].time < time {
            seg += 1;
        }

        let a = &trip.points[seg];
        let b = trip.points.get(seg + 1).unwrap_or(a);
        let span_ms = (b.time - a.time).num_milliseconds();
        let frac = if span_ms > 0 {
            ((time - a.time).num_milliseconds() as f64 / span_ms as f64).clamp(0.0, 1.0)
        } else {
            0.0
        };

        out.push(AisPoint {
            mmsi: trip.mmsi,
            time,
            lat: lerp(a.lat, b.lat, frac),
            lon: lerp(a.lon, b.lon, frac),
            sog: lerp_optional(a.sog, b.sog, frac, lerp),
            cog: lerp_optional(a.cog, b.cog, frac, lerp_course),
        });
    }

    Ok(Some(trip.with_points(out)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{geo::Coord, trip::PortCall};
    use chrono::NaiveDate;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 4, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn call(locode: &str) -> PortCall {
        PortCall {
            locode: locode.to_owned(),
            name: locode.to_owned(),
            position: Coord::default(),
        }
    }

    fn trip(points: Vec<(i64, f64, f64, Option<f64>, Option<f64>)>) -> Trip {
        Trip {
            id: 3,
            mmsi: 42,
            from: call("AAAAA"),
            to: call("BBBBB"),
            arrival: t0() + Duration::days(1),
            points: points
                .into_iter()
                .map(|(secs, lat, lon, sog, cog)| AisPoint {
                    mmsi: 42,
                    time: t0() + Duration::seconds(secs),
                    lat,
                    lon,
                    sog,
                    cog,
                })
                .collect(),
        }
    }

    #[test]
    fn test_course_interpolation_uses_shorter_arc() {
        assert!((lerp_course(350.0, 10.0, 0.5) - 0.0).abs() < 1.0e-9);
        assert!((lerp_course(10.0, 350.0, 0.25) - 5.0).abs() < 1.0e-9);
        assert!((lerp_course(90.0, 180.0, 0.5) - 135.0).abs() < 1.0e-9);
    }

    #[test]
    fn test_interpolate_bins_and_fills() {
        // Two reports in the first 10 minute bin, none in the next two, one in the fourth.
        let t = trip(vec![
            (60, 55.0, 10.0, Some(10.0), Some(350.0)),
            (120, 55.2, 10.2, Some(12.0), Some(10.0)),
            (1860, 55.4, 10.4, None, Some(20.0)),
        ]);

        let inter = interpolate(&t, 600).unwrap();
        assert_eq!(inter.id, 3);
        assert_eq!(inter.to.locode, "BBBBB");
        assert_eq!(inter.len(), 4);

        let times: Vec<i64> = inter
            .points
            .iter()
            .map(|p| (p.time - t0()).num_seconds())
            .collect();
        assert_eq!(times, vec![0, 600, 1200, 1800]);

        assert!((inter.points[0].lat - 55.1).abs() < 1.0e-9);
        assert!((inter.points[1].lat - 55.2).abs() < 1.0e-9);
        assert!((inter.points[2].lat - 55.3).abs() < 1.0e-9);
        assert!((inter.points[3].lat - 55.4).abs() < 1.0e-9);

        assert_eq!(inter.points[0].sog, Some(11.0));
        // No speed known after the first bin.
        assert_eq!(inter.points[3].sog, None);

        // Circular mean of 350 and 10 is 0.
        let cog0 = inter.points[0].cog.unwrap();
        assert!(cog0 < 1.0e-6 || cog0 > 360.0 - 1.0e-6, "{}", cog0);
    }

    #[test]
    fn test_interpolate_grid_is_aligned_to_midnight() {
        let t = trip(vec![
            (7 * 3600 + 59 * 60, 55.0, 10.0, None, None),
            (8 * 3600 + 1, 55.0, 10.0, None, None),
        ]);

        let inter = interpolate(&t, 3600).unwrap();
        assert_eq!(inter.points[0].time, t0() + Duration::hours(7));
        assert_eq!(inter.points[1].time, t0() + Duration::hours(8));
    }

    #[test]
    fn test_interpolate_rejects_bad_interval() {
        let t = trip(vec![(0, 55.0, 10.0, None, None)]);
        assert!(interpolate(&t, 0).is_err());
        assert!(interpolate(&t, -600).is_err());
    }

    #[test]
    fn test_waypoints_exact_count() {
        let t = trip(vec![
            (0, 55.0, 10.0, Some(10.0), Some(90.0)),
            (600, 55.0, 11.0, Some(12.0), Some(90.0)),
            (1800, 56.0, 11.0, Some(8.0), Some(0.0)),
        ]);

        let wp = waypoints(&t, 5).unwrap().unwrap();
        assert_eq!(wp.len(), 5);
        assert_eq!(wp.points[0].time, t.points[0].time);
        assert_eq!(wp.points[4].time, t.points[2].time);

        // Every 450 seconds.
        assert!((wp.points[1].lon - 10.75).abs() < 1.0e-9);
        assert_eq!(wp.points[1].sog, Some(11.5));
        assert!((wp.points[2].lat - 55.25).abs() < 1.0e-9);
        assert!((wp.points[4].lat - 56.0).abs() < 1.0e-9);
        assert!((wp.points[4].lon - 11.0).abs() < 1.0e-9);

        for w in wp.points.windows(2) {
            assert!(w[0].time < w[1].time);
        }
    }

    #[test]
    fn test_waypoints_degenerate() {
        let t = trip(vec![(0, 55.0, 10.0, None, None)]);
        assert!(waypoints(&t, 10).unwrap().is_none());

        let t = trip(vec![]);
        assert!(waypoints(&t, 10).unwrap().is_none());

        let t = trip(vec![(0, 55.0, 10.0, None, None), (60, 55.0, 10.0, None, None)]);
        assert!(waypoints(&t, 1).is_err());
    }
}
