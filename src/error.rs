//! Error type for the water surface.
//!
//! Nothing here is ever surfaced to the user: every variant degrades to a
//! visually reduced effect and a log line.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceError {
    /// Height field buffers could not be allocated.
    BufferAllocation { resolution: usize },
    /// Requested grid resolution is unusable (zero or overflowing).
    InvalidResolution(usize),
    /// Background image bytes could not be decoded.
    ImageDecode(String),
    /// Background reference looked like a data URI but was not one.
    MalformedDataUri,
    /// Config file could not be read, parsed or written.
    Config(String),
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::BufferAllocation { resolution } => {
                write!(f, "failed to allocate {resolution}x{resolution} height buffers")
            }
            SurfaceError::InvalidResolution(resolution) => {
                write!(f, "invalid height field resolution {resolution}")
            }
            SurfaceError::ImageDecode(reason) => write!(f, "failed to decode background: {reason}"),
            SurfaceError::MalformedDataUri => write!(f, "malformed data URI"),
            SurfaceError::Config(reason) => write!(f, "config error: {reason}"),
        }
    }
}

impl std::error::Error for SurfaceError {}
