/*!
 * Removing trips where the vessel did not really travel.
 */

use crate::{
    error::AisError,
    resample::interpolate,
    trip::{Trip, TripList},
    AisResult,
};
use log::debug;
use rustc_hash::FxHashSet as HashSet;

/// What [clean_trips] removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanSummary {
    /// Trips where the vessel covered less than the threshold distance in some interval.
    pub idle: usize,
    /// Trips with a report at or below the speed limit.
    pub slow: usize,
    /// Number of trips removed from the raw trips.
    pub routes_removed: usize,
    /// Number of trips removed from the interpolated trips.
    pub interpolated_removed: usize,
}

/// Check if a vessel covered less than `threshold_km` between any two `interval_s` time steps.
fn is_idle(trip: &Trip, threshold_km: f64, interval_s: i64) -> AisResult<bool> {
    let coarse = interpolate(trip, interval_s)?;

    Ok(coarse
        .points
        .windows(2)
        .any(|w| w[0].distance_km(&w[1]) < threshold_km))
}

/// Check if a vessel reported a speed at or below `speed` knots.
fn is_slow(trip: &Trip, speed: f64) -> bool {
    trip.points
        .iter()
        .filter_map(|p| p.sog)
        .any(|sog| sog <= speed)
}

/**
 * Remove trips where the vessel idled or crawled.
 *
 * The checks are run on the interpolated trips. A trip is idle when, resampled at `interval_s`
 * seconds, two consecutive positions are less than `threshold_km` apart. It is slow when any
 * known speed over ground is at or below `speed` knots. Offending trips are removed by id from
 * both lists.
 */
pub fn clean_trips(
    routes: &mut TripList,
    interpolated: &mut TripList,
    threshold_km: f64,
    interval_s: i64,
    speed: f64,
) -> AisResult<CleanSummary> {
    if !threshold_km.is_finite() || threshold_km < 0.0 {
        return Err(AisError::WrongArguments(format!(
            "distance threshold must be a non-negative number, but was {} km",
            threshold_km
        ))
        .into());
    }

    let mut summary = CleanSummary::default();
    let mut remove: HashSet<u64> = HashSet::default();

    for trip in interpolated.iter() {
        if is_idle(trip, threshold_km, interval_s)? {
            summary.idle += 1;
            remove.insert(trip.id);
        }
    }

    let slow: Vec<u64> = interpolated
        .iter()
        .filter(|t| !remove.contains(&t.id) && is_slow(t, speed))
        .map(|t| t.id)
        .collect();
    summary.slow = slow.len();
    remove.extend(slow);

    summary.routes_removed = routes.remove_ids(&remove);
    summary.interpolated_removed = interpolated.remove_ids(&remove);

    debug!(
        "Cleaning found {} idle and {} slow trips.",
        summary.idle, summary.slow
    );

    Ok(summary)
}
