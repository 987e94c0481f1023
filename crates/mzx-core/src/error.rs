//! Error type for the board and robot codec seams.

use std::error::Error;
use std::fmt;

/// Failure while decoding a board or robot payload.
#[derive(Debug)]
pub enum ObjectError {
    /// The payload ended before the structure it promised.
    Truncated {
        /// What was being decoded when the bytes ran out.
        detail: String,
    },
    /// The payload is present but structurally wrong.
    Malformed {
        /// Human-readable description of the problem.
        detail: String,
    },
}

impl fmt::Display for ObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectError::Truncated { detail } => write!(f, "truncated object data: {detail}"),
            ObjectError::Malformed { detail } => write!(f, "malformed object data: {detail}"),
        }
    }
}

impl Error for ObjectError {}
