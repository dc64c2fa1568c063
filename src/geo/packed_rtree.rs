use super::*;

const RTREE_CHILDREN_PER_NODE: usize = 8;
const HILBERT_ITERATIONS: u32 = 16;

#[derive(Debug)]
enum RTreeNode {
    Node {
        bbox: BoundingBox,
        children: Vec<RTreeNode>,
    },
    Leaf {
        bbox: BoundingBox,
        index: usize,
    },
}

impl RTreeNode {
    fn bounding_box(&self) -> &BoundingBox {
        match self {
            Self::Node { bbox, .. } => bbox,
            Self::Leaf { bbox, .. } => bbox,
        }
    }

    fn new_node(children: Vec<Self>) -> Self {
        let mut bbox = BoundingBox::empty();
        for child in &children {
            bbox.union(child.bounding_box());
        }

        Self::Node { bbox, children }
    }

    fn collect_containing(&self, coord: Coord, buffer: &mut Vec<usize>) {
        if !self.bounding_box().contains(coord) {
            return;
        }

        match self {
            Self::Leaf { index, .. } => buffer.push(*index),
            Self::Node { children, .. } => {
                for child in children {
                    child.collect_containing(coord, buffer);
                }
            }
        }
    }
}

/// A static R-tree over the bounding boxes of a slice of items.
///
/// The tree is bulk loaded once by sorting the items along a Hilbert curve through their
/// centroids and then packing them bottom up, so nearby items end up in the same nodes. It does
/// not keep a reference to the items, queries return indexes into the slice it was built from.
#[derive(Debug)]
pub struct PackedRTree {
    root: Option<RTreeNode>,
}

impl PackedRTree {
    /// Build the tree for `data`.
    pub fn build_for<T: Geo>(data: &[T]) -> Self {
        if data.is_empty() {
            return PackedRTree { root: None };
        }

        let mut domain = BoundingBox::empty();
        for item in data {
            domain.union(&item.bounding_box());
        }
        let hc = HilbertCurve::new(HILBERT_ITERATIONS, domain);

        let mut leaves: Vec<(u64, RTreeNode)> = data
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let bbox = item.bounding_box();
                let hilbert_num = hc.curve_distance(bbox.center());
                (hilbert_num, RTreeNode::Leaf { bbox, index })
            })
            .collect();
        leaves.sort_unstable_by_key(|(h, _)| *h);

        let mut level: Vec<RTreeNode> = leaves.into_iter().map(|(_, leaf)| leaf).collect();
        while level.len() > 1 {
            let mut next_level = Vec::with_capacity(level.len() / RTREE_CHILDREN_PER_NODE + 1);
            let mut children = Vec::with_capacity(RTREE_CHILDREN_PER_NODE);

            for node in level.into_iter() {
                children.push(node);
                if children.len() == RTREE_CHILDREN_PER_NODE {
                    next_level.push(RTreeNode::new_node(children));
                    children = Vec::with_capacity(RTREE_CHILDREN_PER_NODE);
                }
            }

            if !children.is_empty() {
                next_level.push(RTreeNode::new_node(children));
            }

            level = next_level;
        }

        PackedRTree { root: level.pop() }
    }

    /// Indexes of all items whose bounding box contains `coord`, in ascending order.
    pub fn candidates(&self, coord: Coord) -> Vec<usize> {
        let mut buffer = Vec::new();
        if let Some(root) = &self.root {
            root.collect_containing(coord, &mut buffer);
        }
        buffer.sort_unstable();
        buffer
    }
}

/// Maps coordinates in a domain onto distances along a Hilbert curve.
#[derive(Debug)]
struct HilbertCurve {
    side: u32,
    domain: BoundingBox,
}

impl HilbertCurve {
    fn new(iterations: u32, domain: BoundingBox) -> Self {
        debug_assert!((1..=31).contains(&iterations));

        HilbertCurve {
            side: 1u32 << iterations,
            domain,
        }
    }

    fn cell(&self, value: f64, min: f64, max: f64) -> u32 {
        let width = max - min;
        if width <= 0.0 || !width.is_finite() {
            return 0;
        }

        let scaled = (value - min) / width * f64::from(self.side);
        (scaled.max(0.0) as u32).min(self.side - 1)
    }

    fn curve_distance(&self, coord: Coord) -> u64 {
        let mut x = self.cell(coord.lon, self.domain.ll.lon, self.domain.ur.lon);
        let mut y = self.cell(coord.lat, self.domain.ll.lat, self.domain.ur.lat);

        let mut d: u64 = 0;
        let mut s = self.side / 2;
        while s > 0 {
            let rx = u32::from(x & s > 0);
            let ry = u32::from(y & s > 0);
            d += u64::from(s) * u64::from(s) * u64::from((3 * rx) ^ ry);

            // Rotate the quadrant so the curve stays continuous.
            if ry == 0 {
                if rx == 1 {
                    x = self.side - 1 - x;
                    y = self.side - 1 - y;
                }
                std::mem::swap(&mut x, &mut y);
            }
            s /= 2;
        }

        d
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Square(Polygon);

    impl Geo for Square {
        fn centroid(&self) -> Coord {
            self.0.centroid()
        }

        fn bounding_box(&self) -> BoundingBox {
            self.0.bounding_box()
        }
    }

    fn square(lat: f64, lon: f64, size: f64) -> Square {
        Square(Polygon::new(vec![
            Coord { lat, lon },
            Coord {
                lat,
                lon: lon + size,
            },
            Coord {
                lat: lat + size,
                lon: lon + size,
            },
            Coord {
                lat: lat + size,
                lon,
            },
        ]))
    }

    #[test]
    fn test_hilbert_distances_are_unique() {
        let domain = BoundingBox {
            ll: Coord { lat: 0.0, lon: 0.0 },
            ur: Coord { lat: 1.0, lon: 1.0 },
        };
        let hc = HilbertCurve::new(2, domain);

        let mut seen = std::collections::HashSet::new();
        for i in 0..4 {
            for j in 0..4 {
                let c = Coord {
                    lat: (f64::from(i) + 0.5) / 4.0,
                    lon: (f64::from(j) + 0.5) / 4.0,
                };
                let d = hc.curve_distance(c);
                assert!(d < 16);
                assert!(seen.insert(d));
            }
        }
    }

    #[test]
    fn test_candidates_match_brute_force() {
        let mut squares = vec![];
        for i in 0..20 {
            for j in 0..20 {
                squares.push(square(f64::from(i), f64::from(j), 0.5));
            }
        }
        // A big one overlapping many others.
        squares.push(square(2.25, 2.25, 5.0));

        let tree = PackedRTree::build_for(&squares);

        for coord in [
            Coord { lat: 3.25, lon: 3.25 },
            Coord { lat: 0.75, lon: 0.75 },
            Coord { lat: 19.1, lon: 0.1 },
            Coord { lat: -1.0, lon: 5.0 },
        ] {
            let expected: Vec<usize> = squares
                .iter()
                .enumerate()
                .filter(|(_, s)| s.bounding_box().contains(coord))
                .map(|(i, _)| i)
                .collect();

            assert_eq!(tree.candidates(coord), expected);
        }
    }

    #[test]
    fn test_empty_tree() {
        let squares: Vec<Square> = vec![];
        let tree = PackedRTree::build_for(&squares);
        assert!(tree.candidates(Coord { lat: 0.0, lon: 0.0 }).is_empty());
    }
}
