use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unrecognized application status '{0}'")]
    UnrecognizedStatus(String),

    #[error("backend data unavailable: {0}")]
    DataUnavailable(String),

    #[error("session store error: {0}")]
    Session(String),
}

impl From<reqwest::Error> for BoardError {
    fn from(err: reqwest::Error) -> Self {
        BoardError::DataUnavailable(err.to_string())
    }
}

impl From<rusqlite::Error> for BoardError {
    fn from(err: rusqlite::Error) -> Self {
        BoardError::Session(err.to_string())
    }
}

impl From<serde_json::Error> for BoardError {
    fn from(err: serde_json::Error) -> Self {
        BoardError::Session(err.to_string())
    }
}

pub type BoardResult<T> = std::result::Result<T, BoardError>;
