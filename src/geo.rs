/*!
 * Geographic calculations.
 *
 * Everything here works directly on latitude and longitude in degrees. The areas this crate
 * deals with (ports, sea basins) are small enough that treating lat/lon as planar coordinates
 * for point in polygon tests and centroids is good enough.
 */

pub use packed_rtree::PackedRTree;

mod packed_rtree;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    /// Check if two coordinates are within `eps` degrees of each other in both directions.
    pub fn is_close(&self, other: Coord, eps: f64) -> bool {
        (self.lat - other.lat).abs() <= eps && (self.lon - other.lon).abs() <= eps
    }
}

/// A lat/lon aligned rectangle described by its lower left and upper right corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub ll: Coord,
    pub ur: Coord,
}

impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox::empty()
    }
}

impl BoundingBox {
    /// A box that contains nothing and grows to fit whatever is added to it.
    pub const fn empty() -> Self {
        BoundingBox {
            ll: Coord {
                lat: f64::INFINITY,
                lon: f64::INFINITY,
            },
            ur: Coord {
                lat: -f64::INFINITY,
                lon: -f64::INFINITY,
            },
        }
    }

    /// Grow the box to include the coordinate.
    pub fn expand_to(&mut self, coord: Coord) {
        self.ll.lat = self.ll.lat.min(coord.lat);
        self.ll.lon = self.ll.lon.min(coord.lon);
        self.ur.lat = self.ur.lat.max(coord.lat);
        self.ur.lon = self.ur.lon.max(coord.lon);
    }

    /// Grow the box to include another box.
    pub fn union(&mut self, other: &BoundingBox) {
        self.expand_to(other.ll);
        self.expand_to(other.ur);
    }

    /// Check if a coordinate is inside the box, edges included.
    pub fn contains(&self, coord: Coord) -> bool {
        coord.lat >= self.ll.lat
            && coord.lat <= self.ur.lat
            && coord.lon >= self.ll.lon
            && coord.lon <= self.ur.lon
    }

    /// Check if two boxes overlap, with `eps` degrees of slack.
    pub fn overlap(&self, other: &BoundingBox, eps: f64) -> bool {
        !(self.ur.lat + eps < other.ll.lat
            || other.ur.lat + eps < self.ll.lat
            || self.ur.lon + eps < other.ll.lon
            || other.ur.lon + eps < self.ll.lon)
    }

    /// The center point of the box.
    pub fn center(&self) -> Coord {
        Coord {
            lat: (self.ll.lat + self.ur.lat) / 2.0,
            lon: (self.ll.lon + self.ur.lon) / 2.0,
        }
    }
}

/// Anything with a location and an extent.
pub trait Geo {
    fn centroid(&self) -> Coord;
    fn bounding_box(&self) -> BoundingBox;
}

/**
 * the simple great circle distance calculation.
 *
 * #Arguments
 * * lat1 - the latitude of the first point in degrees.
 * * lon1 - the longitude of the first point in degrees.
 * * lat2 - the latitude of the second point in degrees.
 * * lon2 - the longitude of the second point in degrees.
 *
 * #Returns
 * The distance between the points in kilometers.
 */
pub fn great_circle_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const DEG2RAD: f64 = std::f64::consts::PI / 180.0;
    const EARTH_RADIUS_KM: f64 = 6371.0090;

    let lat1_r = lat1 * DEG2RAD;
    let lat2_r = lat2 * DEG2RAD;

    let sin_dlat2 = f64::sin((lat2 - lat1) * DEG2RAD / 2.0);
    let sin_dlon2 = f64::sin((lon2 - lon1) * DEG2RAD / 2.0);

    let h = sin_dlat2 * sin_dlat2 + sin_dlon2 * sin_dlon2 * lat1_r.cos() * lat2_r.cos();

    2.0 * EARTH_RADIUS_KM * f64::asin(h.sqrt().min(1.0))
}

/// A simple polygon made of a single outer ring.
///
/// The ring may or may not repeat the first vertex at the end, both are handled.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    ring: Vec<Coord>,
    bbox: BoundingBox,
}

impl Polygon {
    /// Build a polygon from its vertices.
    pub fn new(mut ring: Vec<Coord>) -> Self {
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }

        let mut bbox = BoundingBox::empty();
        for &c in &ring {
            bbox.expand_to(c);
        }

        Polygon { ring, bbox }
    }

    /// Parse a ring written as `lon lat,lon lat,...`.
    ///
    /// This is the vertex order of well known text, longitude first.
    pub fn parse_lon_lat_pairs(text: &str) -> Result<Self, std::num::ParseFloatError> {
        let mut ring = Vec::new();

        for pair in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let mut parts = pair.split_whitespace();
            let lon: f64 = parts.next().unwrap_or("").parse()?;
            let lat: f64 = parts.next().unwrap_or("").parse()?;
            ring.push(Coord { lat, lon });
        }

        Ok(Polygon::new(ring))
    }

    /// The vertices of the ring, without a repeated closing vertex.
    pub fn vertices(&self) -> &[Coord] {
        &self.ring
    }

    /// Number of distinct vertices.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// A polygon with no vertices.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Even-odd test for a coordinate being interior to the polygon.
    ///
    /// Coordinates on the ring itself are not interior.
    pub fn contains(&self, coord: Coord) -> bool {
        if self.ring.len() < 3 || !self.bbox.contains(coord) {
            return false;
        }

        let mut inside = false;
        let n = self.ring.len();
        let mut j = n - 1;
        for i in 0..n {
            let a = self.ring[i];
            let b = self.ring[j];

            if on_segment(coord, a, b) {
                return false;
            }

            if (a.lat > coord.lat) != (b.lat > coord.lat) {
                let lon_cross = a.lon + (coord.lat - a.lat) / (b.lat - a.lat) * (b.lon - a.lon);
                if coord.lon < lon_cross {
                    inside = !inside;
                }
            }
            j = i;
        }

        inside
    }

    /// Signed area of the ring in square degrees, positive for counter-clockwise rings.
    pub fn signed_area(&self) -> f64 {
        self.shoelace().0
    }

    fn shoelace(&self) -> (f64, f64, f64) {
        let n = self.ring.len();
        let mut area = 0.0;
        let mut lat = 0.0;
        let mut lon = 0.0;

        for i in 0..n {
            let a = self.ring[i];
            let b = self.ring[(i + 1) % n];

            let cross = a.lon * b.lat - b.lon * a.lat;
            area += cross;
            lon += (a.lon + b.lon) * cross;
            lat += (a.lat + b.lat) * cross;
        }

        (area / 2.0, lat, lon)
    }
}

/// Check if `c` lies on the segment from `a` to `b`.
fn on_segment(c: Coord, a: Coord, b: Coord) -> bool {
    const EPS: f64 = 1.0e-12;

    let cross = (b.lon - a.lon) * (c.lat - a.lat) - (b.lat - a.lat) * (c.lon - a.lon);
    if cross.abs() > EPS {
        return false;
    }

    c.lon >= a.lon.min(b.lon) - EPS
        && c.lon <= a.lon.max(b.lon) + EPS
        && c.lat >= a.lat.min(b.lat) - EPS
        && c.lat <= a.lat.max(b.lat) + EPS
}

impl Geo for Polygon {
    fn centroid(&self) -> Coord {
        let (area, lat, lon) = self.shoelace();

        if area.abs() < 1.0e-12 {
            // Degenerate ring, fall back to the vertex mean.
            let n = self.ring.len().max(1) as f64;
            let sum = self.ring.iter().fold(Coord::default(), |acc, c| Coord {
                lat: acc.lat + c.lat,
                lon: acc.lon + c.lon,
            });
            return Coord {
                lat: sum.lat / n,
                lon: sum.lon / n,
            };
        }

        Coord {
            lat: lat / (6.0 * area),
            lon: lon / (6.0 * area),
        }
    }

    fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }
}
