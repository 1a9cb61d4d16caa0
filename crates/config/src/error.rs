//! Config Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A config file was named explicitly but doesn't exist.
    #[display("config file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// The config file extension isn't one of toml, yaml/yml or json.
    #[display("unsupported config format: {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
    /// A source couldn't be parsed into the config shape.
    #[display("unable to parse configuration")]
    Parse,
    /// Parsed fine, but the values can't be used.
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] String),
}

impl ErrorKind {
    /// Config problems never fix themselves.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
