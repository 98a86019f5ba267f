// SPDX-License-Identifier: GPL-3.0-or-later
use std::error::Error as StdError;
use std::fmt;

/// The ways reading a frame from a thermal camera can fail.
pub(crate) enum AcquisitionError {
    /// Communication with the camera failed (I2C errors, a missing device file, etc).
    Bus(anyhow::Error),

    /// The camera returned data that couldn't be turned into a frame.
    Malformed(String),

    /// The camera never reported a complete frame within the allowed number of attempts.
    RetriesExhausted(u32),
}

impl AcquisitionError {
    /// Whether the error is recovered from by substituting a blank frame.
    ///
    /// Retry exhaustion is *not* transient in this sense; it's handled by skipping the entire
    /// tick of the render loop.
    pub(crate) fn is_transient(&self) -> bool {
        !matches!(self, Self::RetriesExhausted(_))
    }
}

impl fmt::Debug for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Bus(e) => f.debug_tuple("Bus").field(e).finish(),
            Self::Malformed(msg) => f.debug_tuple("Malformed").field(msg).finish(),
            Self::RetriesExhausted(n) => f.debug_tuple("RetriesExhausted").field(n).finish(),
        }
    }
}

impl fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "camera I/O error: {:#}", e),
            Self::Malformed(msg) => write!(f, "malformed camera data: {}", msg),
            Self::RetriesExhausted(n) => write!(f, "too many retries ({}) reading frame", n),
        }
    }
}

impl StdError for AcquisitionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Bus(e) => Some(e.as_ref()),
            Self::Malformed(_) => None,
            Self::RetriesExhausted(_) => None,
        }
    }
}

impl From<std::io::Error> for AcquisitionError {
    fn from(e: std::io::Error) -> Self {
        Self::Bus(e.into())
    }
}

/// Errors from generating a single frame.
pub(crate) enum FrameError {
    /// The camera gave up on a frame. The render loop skips the rest of the tick and tries again.
    RetriesExhausted(u32),

    /// Anything else. These end the render loop.
    Fatal(anyhow::Error),
}

impl fmt::Debug for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::RetriesExhausted(n) => f.debug_tuple("RetriesExhausted").field(n).finish(),
            Self::Fatal(e) => f.debug_tuple("Fatal").field(e).finish(),
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::RetriesExhausted(n) => write!(f, "too many retries ({}) reading frame", n),
            Self::Fatal(e) => write!(f, "{:#}", e),
        }
    }
}

impl StdError for FrameError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::RetriesExhausted(_) => None,
            Self::Fatal(e) => Some(e.as_ref()),
        }
    }
}

impl From<AcquisitionError> for FrameError {
    fn from(e: AcquisitionError) -> Self {
        match e {
            AcquisitionError::RetriesExhausted(n) => Self::RetriesExhausted(n),
            other => Self::Fatal(other.into()),
        }
    }
}

impl From<anyhow::Error> for FrameError {
    fn from(e: anyhow::Error) -> Self {
        Self::Fatal(e)
    }
}
