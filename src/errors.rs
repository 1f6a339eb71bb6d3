//! Error handling.

use std::path::PathBuf;

use crate::tsl2561;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// All errors that abort a one-shot read or the monitoring loop.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Could not open I2C device {device:?}: {source}")]
    BusOpen {
        device: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("TSL2561 bus error: {0}")]
    Bus(#[source] BoxError),
}

impl Error {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn bus_open<E>(device: impl Into<PathBuf>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::BusOpen {
            device: device.into(),
            source: Box::new(source),
        }
    }
}

impl<E> From<tsl2561::Error<E>> for Error
where
    E: std::fmt::Debug + Send + Sync + 'static,
{
    fn from(e: tsl2561::Error<E>) -> Self {
        Self::Bus(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
