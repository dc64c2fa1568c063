/*!
 * Ports and looking up which port, if any, a position is in.
 */

use crate::{
    error::AisError,
    files::read_port_rows,
    geo::{BoundingBox, Coord, Geo, PackedRTree, Polygon},
    trip::PortCall,
    AisResult,
};
use std::{fs::File, io::Read, path::Path};

/// A port and the polygon describing its extent.
#[derive(Debug, Clone)]
pub struct Port {
    pub name: String,
    /// UN/LOCODE of the port.
    pub locode: String,
    pub polygon: Polygon,
    centroid: Coord,
}

impl Port {
    pub fn new(name: String, locode: String, polygon: Polygon) -> Self {
        let centroid = polygon.centroid();
        Port {
            name,
            locode,
            polygon,
            centroid,
        }
    }

    /// Describe this port as the end point of a trip.
    pub fn port_call(&self) -> PortCall {
        PortCall {
            locode: self.locode.clone(),
            name: self.name.clone(),
            position: self.centroid,
        }
    }
}

impl Geo for Port {
    fn centroid(&self) -> Coord {
        self.centroid
    }

    fn bounding_box(&self) -> BoundingBox {
        self.polygon.bounding_box()
    }
}

/// The list of known ports, indexed for point lookups.
pub struct PortList {
    ports: Vec<Port>,
    index: PackedRTree,
}

impl From<Vec<Port>> for PortList {
    fn from(ports: Vec<Port>) -> Self {
        let index = PackedRTree::build_for(&ports);
        PortList { ports, index }
    }
}

impl PortList {
    /// Load the ports from a `name;locode;polygon` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> AisResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|_| AisError::Path(path.to_path_buf()))?;
        Self::from_reader(f)
    }

    /// Load the ports from anything readable in the port file format.
    pub fn from_reader<R: Read>(rdr: R) -> AisResult<Self> {
        let ports: Vec<Port> = read_port_rows(rdr)?
            .into_iter()
            .map(|(name, locode, polygon)| Port::new(name, locode, polygon))
            .collect();

        Ok(PortList::from(ports))
    }

    /// Get the number of ports in the list.
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// Check if this list is empty.
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Get an iterator over the ports.
    pub fn iter(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter()
    }

    /// Get a port by its position in the list.
    pub fn get(&self, index: usize) -> Option<&Port> {
        self.ports.get(index)
    }

    /// Find the port containing `coord`.
    ///
    /// If ports overlap, the one listed first in the file wins.
    pub fn locate(&self, coord: Coord) -> Option<usize> {
        self.index
            .candidates(coord)
            .into_iter()
            .find(|&i| self.ports[i].polygon.contains(coord))
    }
}
