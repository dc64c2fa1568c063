/*! Types describing a single AIS position report and the vessel types the database knows. */

use crate::{error::AisError, geo::Coord};
use chrono::NaiveDateTime;
use strum::{EnumIter, IntoEnumIterator};

/// Conversion factor from km/h to knots.
pub const KNOTS_PER_KMH: f64 = 0.53996;

/// A position report from a vessel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AisPoint {
    /// Maritime Mobile Service Identity of the vessel.
    pub mmsi: u32,
    /// Time of the report, UTC.
    pub time: NaiveDateTime,
    pub lat: f64,
    pub lon: f64,
    /// Speed over ground in knots, if it was reported.
    pub sog: Option<f64>,
    /// Course over ground in degrees, if it was reported.
    pub cog: Option<f64>,
}

impl AisPoint {
    pub fn coord(&self) -> Coord {
        Coord {
            lat: self.lat,
            lon: self.lon,
        }
    }

    /// Great circle distance to another point in kilometers.
    pub fn distance_km(&self, other: &AisPoint) -> f64 {
        crate::geo::great_circle_distance(self.lat, self.lon, other.lat, other.lon)
    }
}

/** The ship types that can be requested from the AIS database. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum ShipType {
    Cargo,
    Tanker,
    OtherType,
    Passenger,
    Fishing,
    Towing,
    Tailing,
    PleasureCraft,
    Tug,
    LawEnforcement,
    SearchAndRescue,
    HighSpeedCraft,
    Military,
}

impl ShipType {
    /// The AIS ship type code used in the database.
    pub fn code(&self) -> i32 {
        use ShipType::*;

        match self {
            Cargo => 70,
            Tanker => 80,
            OtherType => 90,
            Passenger => 60,
            Fishing => 30,
            Towing => 31,
            Tailing => 36,
            PleasureCraft => 37,
            Tug => 52,
            LawEnforcement => 55,
            SearchAndRescue => 51,
            HighSpeedCraft => 40,
            Military => 35,
        }
    }

    /// The canonical name, also used as the folder name for downloaded files.
    pub fn name(&self) -> &'static str {
        use ShipType::*;

        match self {
            Cargo => "cargo",
            Tanker => "tanker",
            OtherType => "other type",
            Passenger => "passenger",
            Fishing => "fishing",
            Towing => "towing",
            Tailing => "tailing",
            PleasureCraft => "pleasure craft",
            Tug => "tug",
            LawEnforcement => "law enforcement",
            SearchAndRescue => "search and rescue vessel",
            HighSpeedCraft => "hsc",
            Military => "military",
        }
    }

    /// Look up a ship type by its database code.
    ///
    /// Towing vessels over 200 m long or 25 m wide (code 32) are stored with the other towing
    /// vessels.
    pub fn from_code(code: i32) -> Option<ShipType> {
        let code = if code == 32 { 31 } else { code };
        ShipType::iter().find(|st| st.code() == code)
    }

    /// Look up a ship type by name (case insensitive), alias, or numeric code.
    pub fn from_name(name: &str) -> Option<ShipType> {
        let name = name.trim().to_lowercase();

        if let Ok(code) = name.parse::<i32>() {
            return Self::from_code(code);
        }

        match name.as_str() {
            "high speed craft" => return Some(ShipType::HighSpeedCraft),
            "military ops" => return Some(ShipType::Military),
            _ => {}
        }

        ShipType::iter().find(|st| st.name() == name)
    }

    /// Parse a ship type, with an error listing the valid names.
    pub fn parse(name: &str) -> Result<ShipType, AisError> {
        Self::from_name(name).ok_or_else(|| {
            let valid: Vec<&str> = ShipType::iter().map(|st| st.name()).collect();
            AisError::WrongArguments(format!(
                "shiptype was {}, but should be one of the following types {:?}",
                name, valid
            ))
        })
    }
}

impl std::fmt::Display for ShipType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
