//! Error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A remote command wrote to stderr. Any stderr output fails the
    /// command, whatever its exit status was.
    #[error("Remote command failed: {0}")]
    RemoteCommand(String),

    #[error("SFTP transfer failed: {0}")]
    Sftp(String),

    #[error("Login rejected with HTTP status {0}")]
    Login(u16),

    #[error("Webauth probe rejected with HTTP status {0}")]
    Webauth(u16),

    #[error("Required key {0} missing from remote environment file")]
    MissingKey(String),

    #[error("Unexpected command output: {0}")]
    UnexpectedOutput(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<russh::Error> for Error {
    fn from(err: russh::Error) -> Self {
        Error::Connection(err.to_string())
    }
}

impl From<russh::keys::Error> for Error {
    fn from(err: russh::keys::Error) -> Self {
        Error::Auth(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Config(err.to_string())
    }
}
