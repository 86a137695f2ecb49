use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum NNError {
    // Raised at construction / reconfiguration, nothing is mutated
    InvalidConfiguration(String),

    // Vector or matrix widths that do not line up
    ShapeMismatch(String),

    // Calls made out of order or against neurons that do not exist
    InvalidState(String),

    // The training host's channel is closed
    HostDisconnected,

    IoError(std::io::Error),
    CsvError(csv::Error),
}

impl fmt::Display for NNError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NNError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            NNError::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            NNError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            NNError::HostDisconnected => write!(f, "Training host disconnected"),
            NNError::IoError(err) => write!(f, "I/O error: {}", err),
            NNError::CsvError(err) => write!(f, "CSV error: {}", err),
        }
    }
}

impl From<std::io::Error> for NNError {
    fn from(err: std::io::Error) -> NNError {
        NNError::IoError(err)
    }
}

impl From<csv::Error> for NNError {
    fn from(err: csv::Error) -> NNError {
        NNError::CsvError(err)
    }
}

impl Error for NNError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NNError::IoError(err) => Some(err),
            NNError::CsvError(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, NNError>;
