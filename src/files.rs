/*!
 * Reading and writing the plain text files the programs exchange.
 *
 * All files are `;` separated without a header row:
 *
 * * AIS day files: `mmsi;time;lon;lat;sog;cog` with time as `%Y-%m-%d %H:%M:%S`.
 * * Port files: `name;locode;polygon` with the polygon as `lon lat,lon lat,...`.
 * * Area polygon files: `lat;lon`, one vertex per row.
 */

use crate::{
    ais::{AisPoint, ShipType},
    error::AisError,
    geo::{Coord, Polygon},
    AisResult,
};
use chrono::NaiveDateTime;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DELIMITER: u8 = b';';

/// Join `parts` onto `base` and make sure something exists there.
pub fn check_path<P: AsRef<Path>>(base: P, parts: &[&str]) -> Result<PathBuf, AisError> {
    let mut path = base.as_ref().to_path_buf();
    for part in parts {
        path.push(part);
    }

    if path.exists() {
        Ok(path)
    } else {
        Err(AisError::Path(path))
    }
}

/// List the regular files directly inside a folder, sorted by name.
pub fn list_files<P: AsRef<Path>>(folder: P) -> AisResult<Vec<PathBuf>> {
    let folder = folder.as_ref();
    if !folder.is_dir() {
        return Err(AisError::Path(folder.to_path_buf()).into());
    }

    let mut files = vec![];
    for entry in walkdir::WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn reader<R: Read>(rdr: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(rdr)
}

fn writer<W: Write>(wtr: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .from_writer(wtr)
}

fn parse_optional(field: Option<&str>) -> Option<f64> {
    field
        .and_then(|f| f.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn parse_ais_record(record: &csv::StringRecord) -> Option<AisPoint> {
    let mmsi: u32 = record.get(0)?.parse().ok()?;
    let time = NaiveDateTime::parse_from_str(record.get(1)?, TIME_FORMAT).ok()?;
    let lon = parse_optional(record.get(2))?;
    let lat = parse_optional(record.get(3))?;
    let sog = parse_optional(record.get(4));
    let cog = parse_optional(record.get(5));

    Some(AisPoint {
        mmsi,
        time,
        lat,
        lon,
        sog,
        cog,
    })
}

/// Read AIS position reports from a day file.
///
/// Unparseable speed or course values are treated as missing. Rows where the vessel, time, or
/// position can't be parsed, or that are too short to have them, are skipped. Only a file where
/// no row has the vessel, time and position columns is an error.
pub fn read_ais<R: Read>(rdr: R) -> AisResult<Vec<AisPoint>> {
    let mut points = vec![];
    let mut skipped = 0usize;
    let mut num_rows = 0usize;
    let mut num_short = 0usize;

    for record in reader(rdr).records() {
        let record = record?;
        num_rows += 1;

        if record.len() < 4 {
            num_short += 1;
            skipped += 1;
            continue;
        }

        match parse_ais_record(&record) {
            Some(point) => points.push(point),
            None => skipped += 1,
        }
    }

    if num_rows > 0 && num_short == num_rows {
        return Err(AisError::MissingColumns(vec!["mmsi", "time", "lon", "lat"]).into());
    }

    if skipped > 0 {
        warn!("Skipped {} unparseable AIS rows.", skipped);
    }

    Ok(points)
}

/// Read a single AIS day file.
pub fn read_ais_file<P: AsRef<Path>>(path: P) -> AisResult<Vec<AisPoint>> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|_| AisError::Path(path.to_path_buf()))?;
    read_ais(f)
}

/// Read the AIS day files downloaded for an area and ship type.
///
/// Files are read from `<folder>/<area>/<ship type>/` in name (date) order. `file_amount` limits
/// how many are read, `None` reads them all. The result is sorted by vessel and then time.
pub fn read_ais_folder<P: AsRef<Path>>(
    folder: P,
    area: &str,
    ship_type: ShipType,
    file_amount: Option<usize>,
) -> AisResult<Vec<AisPoint>> {
    let folder_path = check_path(folder, &[area, ship_type.name()])?;

    let mut files = list_files(&folder_path)?;
    if let Some(n) = file_amount {
        files.truncate(n);
    }

    let mut points = vec![];
    let num_files = files.len();
    for (i, file) in files.iter().enumerate() {
        debug!(
            "Progress = {:.2}% - {}",
            i as f64 / num_files as f64 * 100.0,
            file.display()
        );
        points.extend(read_ais_file(file)?);
    }

    points.sort_by(|a, b| a.mmsi.cmp(&b.mmsi).then(a.time.cmp(&b.time)));

    Ok(points)
}

#[derive(Debug, Serialize)]
struct AisRow {
    mmsi: u32,
    time: String,
    lon: f64,
    lat: f64,
    sog: Option<f64>,
    cog: Option<f64>,
}

/// Write AIS position reports in the day file format.
pub fn write_ais<W: Write>(wtr: W, points: &[AisPoint]) -> AisResult<()> {
    let mut wtr = writer(wtr);
    for p in points {
        wtr.serialize(AisRow {
            mmsi: p.mmsi,
            time: p.time.format(TIME_FORMAT).to_string(),
            lon: p.lon,
            lat: p.lat,
            sog: p.sog,
            cog: p.cog,
        })?;
    }
    wtr.flush()?;

    Ok(())
}

/// Write an AIS day file.
pub fn write_ais_file<P: AsRef<Path>>(path: P, points: &[AisPoint]) -> AisResult<()> {
    let f = File::create(path.as_ref())?;
    write_ais(f, points)
}

#[derive(Debug, Deserialize)]
struct PortRow {
    name: String,
    locode: String,
    polygon: String,
}

/// Read the raw rows of a port file as `(name, locode, polygon)`.
pub(crate) fn read_port_rows<R: Read>(rdr: R) -> AisResult<Vec<(String, String, Polygon)>> {
    let mut rows = vec![];

    for record in reader(rdr).records() {
        let record = record?;
        if record.len() < 3 {
            return Err(AisError::MissingColumns(vec!["name", "locode", "polygon"]).into());
        }

        let PortRow {
            name,
            locode,
            polygon,
        } = record.deserialize(None)?;

        let polygon = Polygon::parse_lon_lat_pairs(&polygon).map_err(|err| {
            AisError::WrongArguments(format!("invalid polygon for port {}: {}", locode, err))
        })?;

        rows.push((name, locode, polygon));
    }

    Ok(rows)
}

#[derive(Debug, Serialize, Deserialize)]
struct VertexRow {
    lat: f64,
    lon: f64,
}

/// Read an area polygon, one `lat;lon` vertex per row.
pub fn read_area_polygon<P: AsRef<Path>>(path: P) -> AisResult<Polygon> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|_| AisError::Path(path.to_path_buf()))?;

    let mut ring = vec![];
    for record in reader(f).records() {
        let record = record?;
        if record.len() < 2 {
            return Err(AisError::MissingColumns(vec!["lat", "lon"]).into());
        }

        let VertexRow { lat, lon } = record.deserialize(None)?;
        ring.push(Coord { lat, lon });
    }

    Ok(Polygon::new(ring))
}

/// Write an area polygon, one `lat;lon` vertex per row.
pub fn write_area_polygon<P: AsRef<Path>>(path: P, polygon: &Polygon) -> AisResult<()> {
    let f = File::create(path.as_ref())?;
    let mut wtr = writer(f);
    for v in polygon.vertices() {
        wtr.serialize(VertexRow {
            lat: v.lat,
            lon: v.lon,
        })?;
    }
    wtr.flush()?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_read_ais_coerces_bad_values() {
        let data = concat!(
            "219000001;2021-04-03 00:00:00;12.5;55.5;10.2;90.0\n",
            "219000001;2021-04-03 00:10:00;12.6;55.5;nan;\n",
            "219000001;2021-04-03 00:20:00;12.7;55.5;abc;91.5\n",
            "notanumber;2021-04-03 00:30:00;12.7;55.5;1.0;1.0\n",
            "219000001;2021-04-03 00:40:00;;55.5;1.0;1.0\n",
        );

        let points = read_ais(data.as_bytes()).unwrap();
        assert_eq!(points.len(), 3);

        assert_eq!(points[0].mmsi, 219000001);
        assert_eq!(points[0].lon, 12.5);
        assert_eq!(points[0].lat, 55.5);
        assert_eq!(points[0].sog, Some(10.2));
        assert_eq!(points[1].sog, None);
        assert_eq!(points[1].cog, None);
        assert_eq!(points[2].sog, None);
        assert_eq!(points[2].cog, Some(91.5));
    }

    #[test]
    fn test_read_ais_missing_columns() {
        let data = "219000001;2021-04-03 00:00:00\n";
        let err = read_ais(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AisError>(),
            Some(AisError::MissingColumns(_))
        ));

        assert!(read_ais("".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_list_files_sorted_without_folders() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["2021-04-05.csv", "2021-04-03.csv", "2021-04-04.csv"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("2021-04-01")).unwrap();

        let files = list_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["2021-04-03.csv", "2021-04-04.csv", "2021-04-05.csv"]
        );

        assert!(list_files(dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_read_ais_skips_truncated_row() {
        let data = concat!(
            "219000001;2021-04-03 00:00:00;12.5;55.5;10.2;90.0\n",
            "219000001;2021-04-03 00:10:00;12.6\n",
        );

        let points = read_ais(data.as_bytes()).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].lon, 12.5);
    }

    #[test]
    fn test_write_then_read_ais() {
        let t = NaiveDateTime::parse_from_str("2021-04-03 12:34:56", TIME_FORMAT).unwrap();
        let points = vec![AisPoint {
            mmsi: 1,
            time: t,
            lat: 55.25,
            lon: 12.75,
            sog: None,
            cog: Some(180.0),
        }];

        let mut buf = vec![];
        write_ais(&mut buf, &points).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert_eq!(text, "1;2021-04-03 12:34:56;12.75;55.25;;180.0\n");

        assert_eq!(read_ais(&buf[..]).unwrap(), points);
    }

    #[test]
    fn test_read_port_rows() {
        let data = "Copenhagen;DKCPH;12.5 55.6,12.7 55.6,12.7 55.8,12.5 55.8,12.5 55.6\n";
        let rows = read_port_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);

        let (name, locode, polygon) = &rows[0];
        assert_eq!(name, "Copenhagen");
        assert_eq!(locode, "DKCPH");
        assert_eq!(polygon.len(), 4);
        assert_eq!(polygon.vertices()[0], Coord { lat: 55.6, lon: 12.5 });

        assert!(read_port_rows("Nowhere;XXNOW\n".as_bytes()).is_err());
        assert!(read_port_rows("Nowhere;XXNOW;1 2,x y\n".as_bytes()).is_err());
    }
}
