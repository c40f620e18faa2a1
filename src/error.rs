//! Error type shared by the whole crate. Every fallible operation returns
//! [`Result`], the binary wraps these errors with `anyhow` context.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FitError {
    /// Invalid or inconsistent user input, e.g. unknown names, missing radii
    /// or cutoffs that do not match the reference data.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("shape mismatch for '{context}': expected {expected}, got {found}")]
    Shape {
        context: String,
        expected: usize,
        found: usize,
    },

    #[error("no file found at {0}")]
    NotFound(PathBuf),

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("failed to parse data from file '{file}': {message}")]
    Parse { file: String, message: String },

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("plotting failed: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, FitError>;

impl FitError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        FitError::Config(message.into())
    }

    pub fn shape<S: Into<String>>(context: S, expected: usize, found: usize) -> Self {
        FitError::Shape {
            context: context.into(),
            expected,
            found,
        }
    }
}

impl From<serde_json::Error> for FitError {
    fn from(err: serde_json::Error) -> Self {
        FitError::Serialization(err.to_string())
    }
}

impl From<ron::Error> for FitError {
    fn from(err: ron::Error) -> Self {
        FitError::Serialization(err.to_string())
    }
}
