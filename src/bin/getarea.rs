use aisprep::{download_area, AisResult, DatabaseConfig, PostgresSource};
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
/// Download the outline of an area from the AIS database.
///
/// The polygon is saved with one lat;lon vertex per row, ready for cleanais.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "getarea")]
#[clap(author, version, about)]
struct GetAreaOptionsInit {
    /// The name of the area in the database.
    #[clap(short, long)]
    #[clap(env = "AIS_AREA")]
    area: String,

    /// The file to save the polygon in.
    ///
    /// If this is not specified, it is saved as <folder>/<area>/<area>_polygon.csv.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// The folder the downloaded AIS data is kept in.
    #[clap(short, long)]
    #[clap(env = "AIS_FOLDER")]
    #[clap(default_value = "AIS")]
    folder: PathBuf,

    /// Host of the AIS database.
    #[clap(long)]
    #[clap(env = "AIS_DB_HOST")]
    db_host: String,

    /// Port of the AIS database.
    #[clap(long)]
    #[clap(env = "AIS_DB_PORT")]
    #[clap(default_value_t = 5432)]
    db_port: u16,

    /// Name of the AIS database.
    #[clap(long)]
    #[clap(env = "AIS_DB_NAME")]
    db_name: String,

    /// User name for the AIS database.
    #[clap(long)]
    #[clap(env = "AIS_DB_USER")]
    db_user: String,

    /// Password for the AIS database.
    #[clap(long)]
    #[clap(env = "AIS_DB_PASSWORD")]
    #[clap(hide_env_values = true)]
    db_password: Option<String>,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug)]
struct GetAreaOptionsChecked {
    area: String,
    output: PathBuf,
    db: DatabaseConfig,
    verbose: bool,
}

impl Display for GetAreaOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?;
        writeln!(f, "      Area: {}", self.area)?;
        writeln!(f, "    Output: {}", self.output.display())?;
        writeln!(f, "  Database: {}", self.db)?;
        writeln!(f, "\n")?;

        Ok(())
    }
}

/// Get the command line arguments and check them.
fn parse_args() -> AisResult<GetAreaOptionsChecked> {
    let GetAreaOptionsInit {
        area,
        output,
        folder,
        db_host,
        db_port,
        db_name,
        db_user,
        db_password,
        verbose,
    } = GetAreaOptionsInit::parse();

    let output = match output {
        Some(v) => v,
        None => folder.join(&area).join(format!("{}_polygon.csv", area)),
    };

    let db = DatabaseConfig {
        host: db_host,
        port: db_port,
        dbname: db_name,
        user: db_user,
        password: db_password,
    };

    let checked = GetAreaOptionsChecked {
        area,
        output,
        db,
        verbose,
    };

    Ok(checked)
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

    let mut source = PostgresSource::connect(&opts.db)?;
    download_area(&mut source, &opts.area, &opts.output)?;

    Ok(())
}
