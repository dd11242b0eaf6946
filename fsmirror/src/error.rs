use std::io;
use strum_macros::Display;
use thiserror::Error;

use fsmirror_core::error::RunnerError;

#[derive(Debug, Error, Display)]
pub enum Error {
    StartupError(String),
    RunError(String),
    UnexpectedError(String),
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::UnexpectedError(format!("{:?}", error))
    }
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        Error::UnexpectedError(format!("{:#}", error))
    }
}

impl From<RunnerError> for Error {
    fn from(error: RunnerError) -> Self {
        Error::RunError(format!("{}", error))
    }
}
