//! Error types for the watcher service

use biblestudy_sdk::SdkError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("SDK error: {0}")]
    Sdk(#[from] SdkError),

    #[error("No identity connected")]
    NoIdentity,

    #[error("No claim submitter configured")]
    NoSubmitter,

    #[error("Initial claim status check failed after {attempts} attempts: {reason}")]
    InitialCheckFailed { attempts: u32, reason: String },
}

impl From<std::io::Error> for WatcherError {
    fn from(err: std::io::Error) -> Self {
        WatcherError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for WatcherError {
    fn from(err: toml::de::Error) -> Self {
        WatcherError::SerializationError(err.to_string())
    }
}

impl From<toml::ser::Error> for WatcherError {
    fn from(err: toml::ser::Error) -> Self {
        WatcherError::SerializationError(err.to_string())
    }
}

pub type WatcherResult<T> = Result<T, WatcherError>;
