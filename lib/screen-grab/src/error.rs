use crate::{CaptureStrategy, SessionKind};
use std::{fmt, path::PathBuf, time::Duration};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing, scaling or saving a screenshot.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to connect to the display server: {0}")]
    DisplayConnection(String),

    #[error("{strategy} failed: {reason}")]
    Capture {
        strategy: CaptureStrategy,
        reason: String,
    },

    #[error("read root window failed: {0}")]
    RootWindow(String),

    #[error("no frame arrived from the capture pipeline within {0:?}")]
    PipelineTimeout(Duration),

    #[error("every capture strategy for the {session} session failed: {}", Attempts(.attempts))]
    CaptureExhausted {
        session: SessionKind,
        attempts: Vec<CaptureAttempt>,
    },

    #[error("command `{0}` was not found in PATH")]
    CommandNotFound(String),

    #[error("{0}")]
    Command(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("output directory `{}` does not exist", .0.display())]
    OutputDirMissing(PathBuf),

    #[error("nothing has been captured yet")]
    NothingCaptured,

    #[error("invalid pixel buffer: {0}")]
    InvalidBuffer(String),

    #[error("{0}")]
    Unsupported(String),
}

/// One failed step of a capture chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureAttempt {
    pub strategy: CaptureStrategy,
    pub reason: String,
}

struct Attempts<'a>(&'a [CaptureAttempt]);

impl fmt::Display for Attempts<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "no strategy available");
        }

        for (i, attempt) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", attempt.strategy, attempt.reason)?;
        }
        Ok(())
    }
}
