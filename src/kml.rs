//! Very simple functions for producing KML files suited to viewing trips.
//!
//! This is not a general solution at all, only the elements needed to draw vessel tracks and
//! ports are implemented, with a streaming API so large trip sets never have to be held as a
//! document tree. That means the user is responsible for closing all tags.

use crate::{ais::AisPoint, geo::Coord, AisResult};
use chrono::NaiveDateTime;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

/// A plain KML output file. The document is closed when the value is dropped.
pub struct KmlFile(BufWriter<File>);

impl KmlFile {
    pub fn new<P: AsRef<Path>>(pth: P) -> AisResult<Self> {
        let p = pth.as_ref();

        let f = std::fs::File::create(p)?;
        let mut new = KmlFile(BufWriter::new(f));
        new.start_document()?;
        Ok(new)
    }
}

impl KmlWriter for KmlFile {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.0
    }
}

impl Drop for KmlFile {
    fn drop(&mut self) {
        self.finish_document();
        let _ = self.0.flush();
    }
}

/// A zipped KML file, the document is stored as `doc.kml` inside the archive.
///
/// Call [KmzFile::finish] to see any error from writing the archive, otherwise it is finished
/// quietly when dropped.
pub struct KmzFile {
    zip: Option<ZipWriter<BufWriter<File>>>,
    // Swallows anything written after the archive is closed.
    closed: std::io::Sink,
}

impl KmzFile {
    pub fn new<P: AsRef<Path>>(pth: P) -> AisResult<Self> {
        let f = File::create(pth.as_ref())?;
        let mut zip = ZipWriter::new(BufWriter::new(f));

        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file("doc.kml", options)?;

        let mut new = KmzFile {
            zip: Some(zip),
            closed: std::io::sink(),
        };
        new.start_document()?;
        Ok(new)
    }

    /// Close the document and the archive.
    pub fn finish(&mut self) -> AisResult<()> {
        if self.zip.is_some() {
            self.finish_document();
        }

        if let Some(mut zip) = self.zip.take() {
            let mut inner = zip.finish()?;
            inner.flush()?;
        }

        Ok(())
    }
}

impl KmlWriter for KmzFile {
    fn output(&mut self) -> &mut dyn Write {
        match self.zip.as_mut() {
            Some(zip) => zip,
            None => &mut self.closed,
        }
    }
}

impl Drop for KmzFile {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}

pub trait KmlWriter {
    fn output(&mut self) -> &mut dyn Write;

    /// Put the header out.
    fn start_document(&mut self) -> AisResult<()> {
        const HEADER: &str = concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "\n",
            r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#,
            "\n",
            "<Document>\n"
        );

        self.output().write_all(HEADER.as_bytes())?;

        Ok(())
    }

    /// Close a document.
    fn finish_document(&mut self) {
        const FOOTER: &str = concat!(r#"</Document>"#, "\n", r#"</kml>"#, "\n");
        let _ = self.output().write_all(FOOTER.as_bytes());
    }

    /// Define a shared style for drawing tracks, an `aabbggrr` color and a width in pixels.
    fn track_style(&mut self, id: &str, color: &str, width: f64) -> AisResult<()> {
        writeln!(
            self.output(),
            "<Style id=\"{}\">\n<LineStyle>\n<color>{}</color>\n<width>{}</width>\n</LineStyle>\n</Style>",
            id,
            color,
            width
        )?;
        Ok(())
    }

    /// Define a shared style for marking ports with an icon.
    fn port_style(&mut self, id: &str, icon_url: &str) -> AisResult<()> {
        writeln!(
            self.output(),
            "<Style id=\"{}\">\n<IconStyle>\n<Icon><href>{}</href></Icon>\n</IconStyle>\n</Style>",
            id,
            icon_url
        )?;
        Ok(())
    }

    /// Start a KML folder.
    fn start_folder(&mut self, name: &str) -> AisResult<()> {
        writeln!(self.output(), "<Folder>\n<name>{}</name>", escape(name))?;
        Ok(())
    }

    /// Close out a folder element
    fn finish_folder(&mut self) -> AisResult<()> {
        writeln!(self.output(), "</Folder>")?;
        Ok(())
    }

    /// Start a placemark element drawn with one of the shared styles.
    fn start_placemark(&mut self, name: &str, description: &str, style_id: &str) -> AisResult<()> {
        writeln!(
            self.output(),
            "<Placemark>\n<name>{}</name>\n<description><![CDATA[{}]]></description>\n<styleUrl>#{}</styleUrl>",
            escape(name),
            description,
            style_id
        )?;
        Ok(())
    }

    /// Close out a placemark element.
    fn finish_placemark(&mut self) -> AisResult<()> {
        writeln!(self.output(), "</Placemark>")?;
        Ok(())
    }

    /// Write out a TimeSpan element, times are UTC.
    fn timespan(&mut self, start: NaiveDateTime, end: NaiveDateTime) -> AisResult<()> {
        writeln!(
            self.output(),
            "<TimeSpan>\n<begin>{}</begin>\n<end>{}</end>\n</TimeSpan>",
            start.format("%Y-%m-%dT%H:%M:%SZ"),
            end.format("%Y-%m-%dT%H:%M:%SZ")
        )?;
        Ok(())
    }

    /// Write the reports of a track as a LineString on the ground.
    fn track(&mut self, points: &[AisPoint]) -> AisResult<()> {
        self.output().write_all(
            "<LineString>\n<tessellate>1</tessellate>\n<coordinates>\n".as_bytes(),
        )?;
        for p in points {
            writeln!(self.output(), "{},{},0", p.lon, p.lat)?;
        }
        self.output()
            .write_all("</coordinates>\n</LineString>\n".as_bytes())?;
        Ok(())
    }

    /// Write out a KML Point element
    fn point(&mut self, coord: Coord) -> AisResult<()> {
        writeln!(
            self.output(),
            "<Point>\n<coordinates>{},{},0</coordinates>\n</Point>",
            coord.lon,
            coord.lat
        )?;
        Ok(())
    }
}

/// Escape the characters XML does not allow in element text.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod test {
    use super::*;

    struct Buffer(Vec<u8>);

    impl KmlWriter for Buffer {
        fn output(&mut self) -> &mut dyn Write {
            &mut self.0
        }
    }

    #[test]
    fn test_track_placemark() {
        let time = chrono::NaiveDate::from_ymd_opt(2021, 4, 3)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let points = [AisPoint {
            mmsi: 1,
            time,
            lat: 55.5,
            lon: 12.25,
            sog: None,
            cog: None,
        }];

        let mut buf = Buffer(vec![]);
        buf.start_document().unwrap();
        buf.track_style("track", "ff0080ff", 2.0).unwrap();
        buf.start_folder("A & B").unwrap();
        buf.start_placemark("A & B", "desc", "track").unwrap();
        buf.timespan(time, time).unwrap();
        buf.track(&points).unwrap();
        buf.finish_placemark().unwrap();
        buf.finish_folder().unwrap();
        buf.finish_document();

        let text = String::from_utf8(buf.0).unwrap();
        assert!(text.starts_with("<?xml"));
        assert!(text.contains("<Style id=\"track\">"));
        assert!(text.contains("<name>A &amp; B</name>"));
        assert!(text.contains("12.25,55.5,0\n"));
        assert!(text.contains("<styleUrl>#track</styleUrl>"));
        assert!(text.contains("<begin>2021-04-03T12:00:00Z</begin>"));
        assert!(text.trim_end().ends_with("</kml>"));
    }
}
