//! Numeric identifiers used as dispatch keys
//!
//! None of these carry meaning on their own; they are resolved through the
//! dispatch registry of the container crate.

use crate::error::{PerError, PerResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one IE inside a protocol container (0..=65535)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProtocolIeId(u16);

impl ProtocolIeId {
    pub const MAX: u16 = 65535;

    /// Create a new IE identifier.
    pub fn new(id: u16) -> Self {
        Self(id)
    }

    /// Numeric value of the identifier.
    pub fn value(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ProtocolIeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for ProtocolIeId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

/// Identifier of an elementary procedure (0..=255)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcedureCode(u8);

impl ProcedureCode {
    /// Create a new procedure code.
    pub fn new(code: u8) -> Self {
        Self(code)
    }

    /// Numeric value of the code.
    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ProcedureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for ProcedureCode {
    fn from(code: u8) -> Self {
        Self(code)
    }
}

/// Role of a PDU within an elementary procedure
///
/// Together with the procedure code this forms the dispatch key for the
/// top-level PDU body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    InitiatingMessage,
    SuccessfulOutcome,
    UnsuccessfulOutcome,
    Outcome,
}

impl MessageKind {
    /// Index of the alternative in the top-level PDU CHOICE.
    pub fn choice_index(self) -> u32 {
        match self {
            MessageKind::InitiatingMessage => 0,
            MessageKind::SuccessfulOutcome => 1,
            MessageKind::UnsuccessfulOutcome => 2,
            MessageKind::Outcome => 3,
        }
    }

    /// Build from a top-level PDU CHOICE index.
    pub fn from_choice_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(MessageKind::InitiatingMessage),
            1 => Some(MessageKind::SuccessfulOutcome),
            2 => Some(MessageKind::UnsuccessfulOutcome),
            3 => Some(MessageKind::Outcome),
            _ => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageKind::InitiatingMessage => "initiating-message",
            MessageKind::SuccessfulOutcome => "successful-outcome",
            MessageKind::UnsuccessfulOutcome => "unsuccessful-outcome",
            MessageKind::Outcome => "outcome",
        };
        write!(f, "{}", s)
    }
}

/// Correlation identifier for the messages of one procedure run
///
/// A tagged union of a short (7-bit) or long (15-bit) identifier. The
/// correlation logic itself lives with the consumer; this type only
/// preserves which form was on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionId {
    /// Short form, 0..=127
    Short(u8),
    /// Long form, 0..=32767
    Long(u16),
}

impl TransactionId {
    pub const SHORT_MAX: u16 = 127;
    pub const LONG_MAX: u16 = 32767;

    /// Create a short-form transaction id, checking the 7-bit bound.
    pub fn short(value: u8) -> PerResult<Self> {
        if u16::from(value) > Self::SHORT_MAX {
            return Err(PerError::ConstraintViolation(format!(
                "short transaction id out of range: {}",
                value
            )));
        }
        Ok(TransactionId::Short(value))
    }

    /// Create a long-form transaction id, checking the 15-bit bound.
    pub fn long(value: u16) -> PerResult<Self> {
        if value > Self::LONG_MAX {
            return Err(PerError::ConstraintViolation(format!(
                "long transaction id out of range: {}",
                value
            )));
        }
        Ok(TransactionId::Long(value))
    }

    /// Numeric value regardless of form.
    pub fn value(self) -> u16 {
        match self {
            TransactionId::Short(v) => u16::from(v),
            TransactionId::Long(v) => v,
        }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionId::Short(v) => write!(f, "short:{}", v),
            TransactionId::Long(v) => write!(f, "long:{}", v),
        }
    }
}
