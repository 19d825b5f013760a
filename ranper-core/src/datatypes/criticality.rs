//! Criticality policy attached to every IE and procedure

use crate::error::{PerError, PerResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-IE policy governing what a receiver does when it cannot understand
/// or decode the IE.
///
/// The wire encoding is a three-value ENUMERATED without extension marker;
/// the index mapping is fixed for the whole protocol family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Criticality {
    /// Receiver must reject the whole message if the IE is not understood
    Reject,
    /// Receiver silently skips the IE
    Ignore,
    /// Receiver skips the IE but reports it in criticality diagnostics
    Notify,
}

impl Criticality {
    /// Build from the PER enumeration index.
    pub fn from_index(index: u64) -> PerResult<Self> {
        match index {
            0 => Ok(Criticality::Reject),
            1 => Ok(Criticality::Ignore),
            2 => Ok(Criticality::Notify),
            _ => Err(PerError::ConstraintViolation(format!(
                "criticality index out of range: {}",
                index
            ))),
        }
    }

    /// PER enumeration index of this value.
    pub fn index(self) -> u64 {
        match self {
            Criticality::Reject => 0,
            Criticality::Ignore => 1,
            Criticality::Notify => 2,
        }
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Criticality::Reject => "reject",
            Criticality::Ignore => "ignore",
            Criticality::Notify => "notify",
        };
        write!(f, "{}", s)
    }
}
