// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jason Ish

use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum Error {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Interrupted by user")]
    Interrupted,
}

impl Error {
    /// Returns true for the top-level cancellation path, which ends the session
    /// instead of being reported inline.
    pub(crate) fn is_interrupt(&self) -> bool {
        matches!(self, Error::Interrupted)
    }
}

impl From<inquire::InquireError> for Error {
    fn from(err: inquire::InquireError) -> Self {
        match err {
            inquire::InquireError::OperationInterrupted
            | inquire::InquireError::OperationCanceled => Error::Interrupted,
            inquire::InquireError::IO(e) => Error::Io(e),
            other => Error::Prompt(other.to_string()),
        }
    }
}

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inquire_interrupt_maps_to_interrupted() {
        let err: Error = inquire::InquireError::OperationInterrupted.into();
        assert!(err.is_interrupt());

        let err: Error = inquire::InquireError::OperationCanceled.into();
        assert!(err.is_interrupt());
    }

    #[test]
    fn test_backend_error_is_not_interrupt() {
        let err = Error::Backend("timeout".into());
        assert!(!err.is_interrupt());
        assert_eq!(err.to_string(), "Backend error: timeout");
    }
}
