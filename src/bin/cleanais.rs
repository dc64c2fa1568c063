use aisprep::{AisError, AisResult, CleanAis, ShipType};
use chrono::Duration;
use clap::Parser;
use log::{info, LevelFilter};
use rustc_hash::FxHashSet as HashSet;
use simple_logger::SimpleLogger;
use std::{
    fmt::{self, Display},
    path::PathBuf,
};

/*-------------------------------------------------------------------------------------------------
 *                                     Command Line Options
 *-----------------------------------------------------------------------------------------------*/

///
/// Turn downloaded AIS data into cleaned port to port trips.
///
/// The AIS reports are cut into trips between port stays, trips leaving the area are removed, the
/// trips are interpolated to a fixed time step, and trips where the vessel idled are removed. The
/// raw and interpolated trips are saved as snapshots, and optionally a fixed number of waypoints
/// per trip.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "cleanais")]
#[clap(author, version, about)]
struct CleanAisOptionsInit {
    /// The name of the area the AIS data was downloaded for.
    #[clap(short, long)]
    #[clap(env = "AIS_AREA")]
    area: String,

    /// The type of ship to process.
    #[clap(short, long)]
    #[clap(parse(try_from_str=parse_ship_type))]
    #[clap(default_value_t=ShipType::Cargo)]
    ship_type: ShipType,

    /// The folder the downloaded AIS data is kept in.
    #[clap(short, long)]
    #[clap(env = "AIS_FOLDER")]
    #[clap(default_value = "AIS")]
    folder: PathBuf,

    /// Only read this many day files, all of them if not specified.
    #[clap(long)]
    file_amount: Option<usize>,

    /// The file with the port polygons (name;locode;polygon).
    #[clap(short, long)]
    #[clap(env = "AIS_PORTS")]
    ports: PathBuf,

    /// The file with the area polygon (lat;lon).
    ///
    /// If this is not specified, <folder>/<area>/<area>_polygon.csv is used.
    #[clap(long)]
    polygon: Option<PathBuf>,

    /// The folder to write the snapshots to.
    ///
    /// If this is not specified, the snapshots are written next to the AIS data.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// A port visit with a mean speed at or below this (knots) counts as a stay.
    #[clap(long)]
    #[clap(default_value_t = 3.0)]
    speed_limit: f64,

    /// Trips with fewer AIS reports than this are dropped.
    #[clap(long)]
    #[clap(default_value_t = 10)]
    min_points: usize,

    /// Time step (seconds) of the interpolated trips.
    #[clap(long)]
    #[clap(default_value_t = 600)]
    interval: i64,

    /// Trips covering less than this distance (km) in a cleaning interval are removed.
    #[clap(long)]
    #[clap(default_value_t = 10.0)]
    threshold: f64,

    /// Time step (seconds) for the idle check.
    #[clap(long)]
    #[clap(default_value_t = 86_400)]
    clean_interval: i64,

    /// Trips with a speed at or below this (knots) are removed.
    #[clap(long)]
    #[clap(default_value_t = 0.5)]
    min_speed: f64,

    /// The number of waypoints per trip. No waypoints are made if not specified.
    #[clap(short, long)]
    waypoints: Option<usize>,

    /// Trips shorter than this (minutes) get no waypoints.
    #[clap(long)]
    #[clap(default_value_t = 30)]
    min_duration: i64,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

fn parse_ship_type(ship_type: &str) -> Result<ShipType, AisError> {
    ShipType::parse(ship_type)
}

#[derive(Debug)]
struct CleanAisOptionsChecked {
    area: String,
    ship_type: ShipType,
    folder: PathBuf,
    file_amount: Option<usize>,
    ports: PathBuf,
    polygon: PathBuf,
    output: PathBuf,
    speed_limit: f64,
    min_points: usize,
    interval: i64,
    threshold: f64,
    clean_interval: i64,
    min_speed: f64,
    waypoints: Option<usize>,
    min_duration: Duration,
    verbose: bool,
}

impl Display for CleanAisOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?;
        writeln!(f, "           Area: {}", self.area)?;
        writeln!(f, "      Ship type: {}", self.ship_type)?;
        writeln!(f, "    AIS folder: {}", self.folder.display())?;
        match self.file_amount {
            Some(n) => writeln!(f, "    File amount: {}", n)?,
            None => writeln!(f, "    File amount: all")?,
        }
        writeln!(f, "          Ports: {}", self.ports.display())?;
        writeln!(f, "        Polygon: {}", self.polygon.display())?;
        writeln!(f, "         Output: {}", self.output.display())?;
        writeln!(f, "    Speed limit: {} kn", self.speed_limit)?;
        writeln!(f, "     Min points: {}", self.min_points)?;
        writeln!(f, "       Interval: {} s", self.interval)?;
        writeln!(f, "      Threshold: {} km", self.threshold)?;
        writeln!(f, " Clean interval: {} s", self.clean_interval)?;
        writeln!(f, "      Min speed: {} kn", self.min_speed)?;
        match self.waypoints {
            Some(n) => writeln!(f, "      Waypoints: {}", n)?,
            None => writeln!(f, "      Waypoints: none")?,
        }
        writeln!(f, "   Min duration: {} min", self.min_duration.num_minutes())?;
        writeln!(f, "\n")?;

        Ok(())
    }
}

/// Get the command line arguments and check them.
fn parse_args() -> AisResult<CleanAisOptionsChecked> {
    let CleanAisOptionsInit {
        area,
        ship_type,
        folder,
        file_amount,
        ports,
        polygon,
        output,
        speed_limit,
        min_points,
        interval,
        threshold,
        clean_interval,
        min_speed,
        waypoints,
        min_duration,
        verbose,
    } = CleanAisOptionsInit::parse();

    let polygon = match polygon {
        Some(v) => v,
        None => folder.join(&area).join(format!("{}_polygon.csv", area)),
    };

    let output = match output {
        Some(v) => v,
        None => folder.join(&area).join(ship_type.name()),
    };

    if interval <= 0 || clean_interval <= 0 {
        return Err(AisError::WrongArguments("intervals must be positive".to_owned()).into());
    }

    if let Some(n) = waypoints {
        if n < 2 {
            return Err(AisError::WrongArguments(format!(
                "at least 2 waypoints are needed, but {} were requested",
                n
            ))
            .into());
        }
    }

    Ok(CleanAisOptionsChecked {
        area,
        ship_type,
        folder,
        file_amount,
        ports,
        polygon,
        output,
        speed_limit,
        min_points,
        interval,
        threshold,
        clean_interval,
        min_speed,
        waypoints,
        min_duration: Duration::minutes(min_duration),
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

    let mut clean = CleanAis::new(true);

    //
    // Load the inputs.
    //
    clean.import_ais(&opts.folder, &opts.area, opts.ship_type, opts.file_amount)?;
    clean.import_ports(&opts.ports)?;
    clean.import_polygon(&opts.polygon)?;

    //
    // Build and clean the trips.
    //
    clean.create_routes(opts.speed_limit, opts.min_points)?;
    clean.remove_routes_outside_polygon()?;
    clean.interpolate_routes(opts.interval)?;
    clean.clean_data(opts.threshold, opts.clean_interval, opts.min_speed)?;

    //
    // Save the results.
    //
    std::fs::create_dir_all(&opts.output)?;
    clean.save_routes(opts.output.join("routes.sqlite"))?;
    clean.save_interpolated(opts.output.join("interpolated.sqlite"))?;

    if let Some(count) = opts.waypoints {
        clean.create_waypoints(count, opts.min_duration)?;
        clean.save_waypoints(opts.output.join("waypoints.sqlite"))?;
    }

    if let Some(routes) = clean.routes() {
        info!(
            "Finished with {} trips of {} vessels.",
            routes.len(),
            routes
                .iter()
                .map(|t| t.mmsi)
                .collect::<HashSet<u32>>()
                .len()
        );
    }

    Ok(())
}
