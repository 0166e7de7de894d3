//
// Errors
//
use std::error;
use std::fmt;
use std::io;
use std::num;
use std::path::PathBuf;
use std::result;


/// Type alias for pattext errors
pub type Result<X> = result::Result<X, Error>;

/// Wrapper for many kinds of errors occuring along the pipeline
#[derive(Debug)]
pub enum Error {
    IOError(io::Error),
    ParseIntError(num::ParseIntError),
    ParseFloatError(num::ParseFloatError),
    HttpError(reqwest::Error),
    /// A row in one of our tables could not be read: (file, 1-based line, what went wrong)
    Malformed(PathBuf, usize, String),
    MissingFile(&'static str, Option<io::Error>),
    Other(String),
}

impl Error {
    pub fn malformed<P: Into<PathBuf>, S: Into<String>>(path: P, line: usize, info: S) -> Error {
        Error::Malformed(path.into(), line, info.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::IOError(ref err) => write!(f, "IO error: {}", err),
            Error::ParseIntError(ref err) => write!(f, "Error parsing integer: {}", err),
            Error::ParseFloatError(ref err) => write!(f, "Error parsing float: {}", err),
            Error::HttpError(ref err) => write!(f, "HTTP error: {}", err),
            Error::Malformed(ref path, line, ref info) => {
                write!(f, "Malformed row at {}:{}: {}", path.display(), line, info)
            }
            Error::MissingFile(ref info, ref opt_err) => {
                write!(f,
                    "The {} must already exist at this point but there was a problem opening it. \
                    Wrong data directory? Maybe missed a step? The OS error was: ",
                    info)?;
                if let Some(ref err) = *opt_err { err.fmt(f) }
                else { write!(f, "Unknown") }
            },
            Error::Other(ref info) => write!(f, "{}", info),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::IOError(ref err) => Some(err),
            Error::ParseIntError(ref err) => Some(err),
            Error::ParseFloatError(ref err) => Some(err),
            Error::HttpError(ref err) => Some(err),
            Error::Malformed(..) => None,
            Error::MissingFile(_, Some(ref err)) => Some(err),
            Error::MissingFile(_, None) => None,
            Error::Other(_) => None,
        }
    }
}
//
// Convert everything else into Error
//
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IOError(err)
    }
}
impl From<num::ParseIntError> for Error {
    fn from(err: num::ParseIntError) -> Self {
        Error::ParseIntError(err)
    }
}
impl From<num::ParseFloatError> for Error {
    fn from(err: num::ParseFloatError) -> Self {
        Error::ParseFloatError(err)
    }
}
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::HttpError(err)
    }
}

//
// Convert Error into a general io Error
//
impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        io::Error::new(io::ErrorKind::Other, err)
    }
}
