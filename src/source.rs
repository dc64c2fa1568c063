/*!
 * Downloading AIS reports and area polygons from the AIS database.
 */

use crate::{
    ais::{AisPoint, ShipType},
    error::AisError,
    files::{write_ais_file, write_area_polygon},
    geo::{Coord, Polygon},
    AisResult,
};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use postgres::{Client, Config, NoTls};
use std::{
    fmt::{self, Display},
    path::Path,
};

/// Something that can provide AIS reports and named area polygons.
pub trait AisSource {
    /// Get the valid reports of one day from vessels of a ship type that passed through an area.
    fn fetch_day(
        &mut self,
        date: NaiveDate,
        ship_type: ShipType,
        area: &str,
    ) -> AisResult<Vec<AisPoint>>;

    /// Get the outline of a named area.
    fn fetch_area(&mut self, area: &str) -> AisResult<Polygon>;
}

/// How to reach the AIS database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: Option<String>,
}

impl Display for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // Never print the password.
        write!(
            f,
            "{}@{}:{}/{}",
            self.user, self.host, self.port, self.dbname
        )
    }
}

/// The AIS database, reached over a Postgres connection.
pub struct PostgresSource {
    client: Client,
}

impl PostgresSource {
    /// Connect to the database.
    pub fn connect(config: &DatabaseConfig) -> AisResult<Self> {
        let mut pg_config = Config::new();
        pg_config
            .host(&config.host)
            .port(config.port)
            .user(&config.user)
            .dbname(&config.dbname);

        if let Some(password) = &config.password {
            pg_config.password(password);
        }

        let client = pg_config
            .connect(NoTls)
            .map_err(|err| AisError::Connection(format!("{}: {}", config, err)))?;

        info!("Connected to {}", config);

        Ok(PostgresSource { client })
    }
}

impl AisSource for PostgresSource {
    fn fetch_day(
        &mut self,
        date: NaiveDate,
        ship_type: ShipType,
        area: &str,
    ) -> AisResult<Vec<AisPoint>> {
        const QUERY: &str = include_str!("source/query_day.sql");

        let rows = self
            .client
            .query(QUERY, &[&date, &ship_type.code(), &area])
            .map_err(|err| AisError::Connection(format!("querying {}: {}", date, err)))?;

        let mut points = Vec::with_capacity(rows.len());
        let mut skipped = 0;
        for row in rows {
            let mmsi: i64 = row.try_get(0)?;
            let mmsi = match u32::try_from(mmsi) {
                Ok(mmsi) => mmsi,
                Err(_) => {
                    skipped += 1;
                    continue;
                }
            };

            let time: NaiveDateTime = row.try_get(1)?;
            let lon: Option<f64> = row.try_get(2)?;
            let lat: Option<f64> = row.try_get(3)?;

            let (lat, lon) = match (lat, lon) {
                (Some(lat), Some(lon)) => (lat, lon),
                _ => {
                    skipped += 1;
                    continue;
                }
            };

            points.push(AisPoint {
                mmsi,
                time,
                lat,
                lon,
                sog: row.try_get(4)?,
                cog: row.try_get(5)?,
            });
        }

        if skipped > 0 {
            warn!("Skipped {} rows without a vessel or position on {}.", skipped, date);
        }

        Ok(points)
    }

    fn fetch_area(&mut self, area: &str) -> AisResult<Polygon> {
        const QUERY: &str = include_str!("source/query_area.sql");

        let rows = self
            .client
            .query(QUERY, &[&area])
            .map_err(|err| AisError::Connection(format!("querying area {}: {}", area, err)))?;

        let ring = rows
            .iter()
            .map(|row| -> AisResult<Coord> {
                Ok(Coord {
                    lat: row.try_get(0)?,
                    lon: row.try_get(1)?,
                })
            })
            .collect::<AisResult<Vec<Coord>>>()?;

        if ring.is_empty() {
            return Err(AisError::WrongArguments(format!("no area named {}", area)).into());
        }

        Ok(Polygon::new(ring))
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(date: &str) -> Result<NaiveDate, AisError> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
        AisError::WrongArguments(format!(
            "dates should be formatted as (YYYY-MM-DD) but was {}",
            date
        ))
    })
}

/// All days from `start` to `end`, both included.
pub fn date_range(
    start: NaiveDate,
    end: NaiveDate,
) -> Result<impl Iterator<Item = NaiveDate>, AisError> {
    if start > end {
        return Err(AisError::WrongArguments(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }

    Ok(start.iter_days().take_while(move |day| *day <= end))
}

/**
 * Download the AIS reports of a ship type in an area, one file per day.
 *
 * Files are written to `<folder>/<area>/<ship type>/<YYYY-MM-DD>.csv`. Days without any reports
 * still get an empty file.
 *
 * # Returns
 * The number of reports written.
 */
pub fn download_ais<S: AisSource + ?Sized, P: AsRef<Path>>(
    source: &mut S,
    ship_type: ShipType,
    start: NaiveDate,
    end: NaiveDate,
    area: &str,
    folder: P,
) -> AisResult<usize> {
    let days: Vec<NaiveDate> = date_range(start, end)?.collect();
    info!("{} days are queried.", days.len());

    let out_dir = folder.as_ref().join(area).join(ship_type.name());
    std::fs::create_dir_all(&out_dir)?;

    let mut total = 0;
    for day in days {
        debug!("Fetching results from {}", day);

        let points = source.fetch_day(day, ship_type, area)?;
        let path = out_dir.join(format!("{}.csv", day.format("%Y-%m-%d")));
        write_ais_file(&path, &points)?;

        debug!("Wrote {} reports to {}", points.len(), path.display());
        total += points.len();
    }

    Ok(total)
}

/// Download the outline of an area into an area polygon file.
pub fn download_area<S: AisSource + ?Sized, P: AsRef<Path>>(
    source: &mut S,
    area: &str,
    path: P,
) -> AisResult<Polygon> {
    let path = path.as_ref();
    let polygon = source.fetch_area(area)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    write_area_polygon(path, &polygon)?;

    info!(
        "Saved area {} with {} vertices to {}",
        area,
        polygon.len(),
        path.display()
    );

    Ok(polygon)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::files::{read_ais_file, read_ais_folder, read_area_polygon};
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemorySource {
        days: HashMap<NaiveDate, Vec<AisPoint>>,
        requests: Vec<(NaiveDate, ShipType, String)>,
    }

    impl AisSource for MemorySource {
        fn fetch_day(
            &mut self,
            date: NaiveDate,
            ship_type: ShipType,
            area: &str,
        ) -> AisResult<Vec<AisPoint>> {
            self.requests.push((date, ship_type, area.to_owned()));
            Ok(self.days.get(&date).cloned().unwrap_or_default())
        }

        fn fetch_area(&mut self, area: &str) -> AisResult<Polygon> {
            if area != "Kattegat" {
                return Err(AisError::WrongArguments(format!("no area named {}", area)).into());
            }

            Ok(Polygon::new(vec![
                Coord { lat: 56.0, lon: 10.5 },
                Coord { lat: 56.0, lon: 12.5 },
                Coord { lat: 57.5, lon: 12.5 },
                Coord { lat: 57.5, lon: 10.5 },
            ]))
        }
    }

    fn report(mmsi: u32, date: NaiveDate, hour: u32) -> AisPoint {
        AisPoint {
            mmsi,
            time: date.and_hms_opt(hour, 0, 0).unwrap(),
            lat: 56.5,
            lon: 11.0 + f64::from(hour) * 0.01,
            sog: Some(12.0),
            cog: None,
        }
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2021-04-03").unwrap(),
            NaiveDate::from_ymd_opt(2021, 4, 3).unwrap()
        );
        assert!(matches!(
            parse_date("03/04/2021"),
            Err(AisError::WrongArguments(_))
        ));
    }

    #[test]
    fn test_date_range() {
        let start = parse_date("2021-02-27").unwrap();
        let end = parse_date("2021-03-02").unwrap();

        let days: Vec<NaiveDate> = date_range(start, end).unwrap().collect();
        assert_eq!(days.len(), 4);
        assert_eq!(days[0], start);
        assert_eq!(days[3], end);

        assert_eq!(date_range(start, start).unwrap().count(), 1);
        assert!(date_range(end, start).is_err());
    }

    #[test]
    fn test_download_ais() {
        let dir = tempfile::tempdir().unwrap();
        let d1 = parse_date("2021-04-03").unwrap();
        let d2 = parse_date("2021-04-04").unwrap();
        let d3 = parse_date("2021-04-05").unwrap();

        let mut source = MemorySource::default();
        source
            .days
            .insert(d1, vec![report(2, d1, 3), report(1, d1, 1), report(1, d1, 2)]);
        source.days.insert(d3, vec![report(5, d3, 0)]);

        let n = download_ais(&mut source, ShipType::Tanker, d1, d3, "Kattegat", dir.path()).unwrap();
        assert_eq!(n, 4);
        assert_eq!(source.requests.len(), 3);
        assert_eq!(source.requests[1], (d2, ShipType::Tanker, "Kattegat".to_owned()));

        // The day without reports is still marked as fetched.
        let empty = dir.path().join("Kattegat/tanker/2021-04-04.csv");
        assert!(empty.is_file());
        assert!(read_ais_file(&empty).unwrap().is_empty());

        let points = read_ais_folder(dir.path(), "Kattegat", ShipType::Tanker, None).unwrap();
        let order: Vec<(u32, u32)> = points
            .iter()
            .map(|p| (p.mmsi, chrono::Timelike::hour(&p.time)))
            .collect();
        assert_eq!(order, vec![(1, 1), (1, 2), (2, 3), (5, 0)]);

        let first_day = read_ais_folder(dir.path(), "Kattegat", ShipType::Tanker, Some(1)).unwrap();
        assert_eq!(first_day.len(), 3);
    }

    #[test]
    fn test_download_ais_bad_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MemorySource::default();

        let start = parse_date("2021-04-05").unwrap();
        let end = parse_date("2021-04-03").unwrap();
        assert!(download_ais(&mut source, ShipType::Cargo, start, end, "Kattegat", dir.path()).is_err());
        assert!(source.requests.is_empty());
    }

    #[test]
    fn test_download_area() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("areas").join("kattegat.csv");
        let mut source = MemorySource::default();

        let polygon = download_area(&mut source, "Kattegat", &path).unwrap();
        assert_eq!(read_area_polygon(&path).unwrap(), polygon);

        assert!(download_area(&mut source, "Nowhere", dir.path().join("x.csv")).is_err());
    }
}
