use aisprep::{load_trips, AisResult};
use clap::Parser;
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;
use std::{
    fmt::{self, Display},
    path::PathBuf,
};

/*-------------------------------------------------------------------------------------------------
 *                                     Command Line Options
 *-----------------------------------------------------------------------------------------------*/

///
/// Export a trip snapshot into a KML or KMZ file.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "exportkml")]
#[clap(author, version, about)]
struct ExportKmlOptionsInit {
    /// The snapshot to export, as written by cleanais.
    snapshot: PathBuf,

    /// The path to the KML or KMZ file to produce, chosen by the extension.
    ///
    /// If this is not specified, then the program will create one automatically by replacing the
    /// file extension on the snapshot with "*.kmz".
    #[clap(short, long)]
    kml_file: Option<PathBuf>,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug)]
struct ExportKmlOptionsChecked {
    snapshot: PathBuf,
    kml_file: PathBuf,
    verbose: bool,
}

impl Display for ExportKmlOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?;
        writeln!(f, "  Snapshot: {}", self.snapshot.display())?;
        writeln!(f, "    Output: {}", self.kml_file.display())?;
        writeln!(f, "\n")?;

        Ok(())
    }
}

/// Get the command line arguments and check them.
fn parse_args() -> AisResult<ExportKmlOptionsChecked> {
    let ExportKmlOptionsInit {
        snapshot,
        kml_file,
        verbose,
    } = ExportKmlOptionsInit::parse();

    let kml_file = match kml_file {
        Some(v) => v,
        None => {
            let mut clone = snapshot.clone();
            clone.set_extension("kmz");
            clone
        }
    };

    Ok(ExportKmlOptionsChecked {
        snapshot,
        kml_file,
        verbose,
    })
}

/*-------------------------------------------------------------------------------------------------
 *                                             MAIN
 *-----------------------------------------------------------------------------------------------*/
fn main() -> AisResult<()> {
    let opts = parse_args()?;

    let level = if opts.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new().with_level(level).init()?;

    if opts.verbose {
        info!("{}", opts);
    }

    let trips = load_trips(&opts.snapshot)?;
    info!("Retrieved {} trips.", trips.len());

    let is_kml = opts
        .kml_file
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("kml"))
        .unwrap_or(false);

    if is_kml {
        trips.save_kml(&opts.kml_file)?;
    } else {
        trips.save_kmz(&opts.kml_file)?;
    }

    info!("Saved {}", opts.kml_file.display());

    Ok(())
}
