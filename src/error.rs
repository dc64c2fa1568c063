use std::{
    error::Error,
    fmt::{Display, Formatter},
    path::PathBuf,
};

/// Errors raised by the library itself, as opposed to those passed through from a dependency.
#[derive(Debug, Clone)]
pub enum AisError {
    /// A step needed data that an earlier step should have produced.
    NotDefined(&'static str),
    /// There is nothing at this path.
    Path(PathBuf),
    /// The input to a function was invalid.
    WrongArguments(String),
    /// Connecting to or querying the AIS database failed.
    Connection(String),
    /// A table read from disk did not have all the required columns.
    MissingColumns(Vec<&'static str>),
}

impl Display for AisError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        use AisError::*;

        match self {
            NotDefined(name) => write!(
                f,
                "{} does not exist, run the step that creates it first",
                name
            ),
            Path(path) => write!(f, "No file at: {}", path.display()),
            WrongArguments(msg) => write!(f, "{}", msg),
            Connection(msg) => write!(f, "database connection error: {}", msg),
            MissingColumns(cols) => write!(
                f,
                "the following columns are missing in the dataset: {}",
                cols.join(", ")
            ),
        }
    }
}

impl Error for AisError {}
