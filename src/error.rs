use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

use crate::status::SelectionStatus;

#[derive(Debug, Error, Diagnostic)]
pub enum ShelfError {
    #[error("does not match the session-name pattern: {0}")]
    InvalidSessionName(String),

    #[error("does not match the session-type pattern: {0}")]
    InvalidSessionType(String),

    #[error("failed to parse session date: {0}")]
    InvalidDate(String),

    #[error("failed to parse '{0}' into an index")]
    InvalidIndex(String),

    #[error("does not match the name pattern: {0}")]
    InvalidName(String),

    #[error("does not match the channel pattern: {0}")]
    InvalidChannel(String),

    #[error("file name contains '{keyword}', but is not indexed: {rest}")]
    UnindexedBlock { keyword: &'static str, rest: String },

    #[error("not a well-formed data file name: {0}")]
    InvalidFileName(String),

    #[error("invalid specification: {0}")]
    InvalidSpecification(String),

    #[error("cannot represent index {index} in a {width}-digit number")]
    IndexWidth { index: u32, width: usize },

    #[error("cannot compute a path: selection is not single (status: {status})")]
    AmbiguousSelection { status: SelectionStatus },

    #[error("cannot compute a path: selection remains unspecified (status: {status})")]
    UnspecifiedSelection { status: SelectionStatus },

    #[error("path does not exist: {0}")]
    NotFound(String),

    #[error("cannot represent level '{level}' from this specification")]
    WrongLevel { level: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("no I/O driver registered for: {0}")]
    NoDriver(String),

    #[error("data I/O failed: {0}")]
    DriverIo(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
