use aisprep::{
    download_ais, parse_date, AisError, AisResult, DatabaseConfig, PostgresSource, ShipType,
};
use chrono::NaiveDate;
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
/// Download AIS position reports from the AIS database.
///
/// One file is written per day into <folder>/<area>/<ship type>/<YYYY-MM-DD>.csv.
///
#[derive(Debug, Parser)]
#[clap(bin_name = "getais")]
#[clap(author, version, about)]
struct GetAisOptionsInit {
    /// The first day to download, formatted as YYYY-MM-DD.
    #[clap(parse(try_from_str=parse_date))]
    start: NaiveDate,

    /// The last day to download, formatted as YYYY-MM-DD.
    ///
    /// If this is not specified, only the start day is downloaded.
    #[clap(parse(try_from_str=parse_date))]
    end: Option<NaiveDate>,

    /// The name of the area in the database.
    #[clap(short, long)]
    #[clap(env = "AIS_AREA")]
    area: String,

    /// The type of ship to download reports for.
    ///
    /// Either a name like "cargo" or "pleasure craft", or an AIS ship type code.
    #[clap(short, long)]
    #[clap(parse(try_from_str=parse_ship_type))]
    #[clap(default_value_t=ShipType::Cargo)]
    ship_type: ShipType,

    /// The folder to save the day files in.
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

fn parse_ship_type(ship_type: &str) -> Result<ShipType, AisError> {
    ShipType::parse(ship_type)
}

#[derive(Debug)]
struct GetAisOptionsChecked {
    start: NaiveDate,
    end: NaiveDate,
    area: String,
    ship_type: ShipType,
    folder: PathBuf,
    db: DatabaseConfig,
    verbose: bool,
}

impl Display for GetAisOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?;
        writeln!(f, "      Start: {}", self.start)?;
        writeln!(f, "        End: {}", self.end)?;
        writeln!(f, "       Area: {}", self.area)?;
        writeln!(f, "  Ship type: {}", self.ship_type)?;
        writeln!(f, "     Folder: {}", self.folder.display())?;
        writeln!(f, "   Database: {}", self.db)?;
        writeln!(f, "\n")?;

        Ok(())
    }
}

/// Get the command line arguments and check them.
fn parse_args() -> AisResult<GetAisOptionsChecked> {
    let GetAisOptionsInit {
        start,
        end,
        area,
        ship_type,
        folder,
        db_host,
        db_port,
        db_name,
        db_user,
        db_password,
        verbose,
    } = GetAisOptionsInit::parse();

    let end = end.unwrap_or(start);
    if start > end {
        return Err(AisError::WrongArguments(format!(
            "start date {} is after end date {}",
            start, end
        ))
        .into());
    }

    let db = DatabaseConfig {
        host: db_host,
        port: db_port,
        dbname: db_name,
        user: db_user,
        password: db_password,
    };

    let checked = GetAisOptionsChecked {
        start,
        end,
        area,
        ship_type,
        folder,
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
    let num_rows = download_ais(
        &mut source,
        opts.ship_type,
        opts.start,
        opts.end,
        &opts.area,
        &opts.folder,
    )?;

    info!(
        "Downloaded {} reports for {} in {} to {}",
        num_rows,
        opts.ship_type,
        opts.area,
        opts.folder.display()
    );

    Ok(())
}
