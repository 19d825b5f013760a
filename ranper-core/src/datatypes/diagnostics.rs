//! Criticality diagnostics records
//!
//! Structured report describing which IEs of an inbound message could not
//! be processed and why. Built by the container crate while decoding and
//! returned to the consumer, either alongside a decoded body or inside a
//! rejection error.

use crate::datatypes::criticality::Criticality;
use crate::datatypes::ids::{MessageKind, ProcedureCode, ProtocolIeId, TransactionId};
use serde::{Deserialize, Serialize};

/// Why a particular IE is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeOfError {
    /// The IE was present but could not be understood (unregistered id or
    /// undecodable payload)
    NotUnderstood,
    /// A mandatory IE was absent from the container
    Missing,
}

/// One element of the path from the message root to a nested IE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructurePathElement {
    pub ie_id: ProtocolIeId,
    pub repetition_number: Option<u32>,
}

/// Report entry for a single IE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IeCriticalityDiagnostics {
    /// Criticality the sender attached to the IE
    pub criticality: Criticality,
    /// Identifier of the IE being reported
    pub ie_id: ProtocolIeId,
    /// Which occurrence of a repeated IE, counted from zero in wire order
    pub repetition_number: Option<u32>,
    /// Path to the IE when it sits below the top-level container
    pub message_structure: Option<Vec<StructurePathElement>>,
    /// What went wrong
    pub type_of_error: TypeOfError,
}

/// Structured error report for one inbound message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriticalityDiagnostics {
    pub procedure_code: Option<ProcedureCode>,
    pub triggering_message: Option<MessageKind>,
    pub procedure_criticality: Option<Criticality>,
    pub transaction_id: Option<TransactionId>,
    pub ie_errors: Vec<IeCriticalityDiagnostics>,
}

impl CriticalityDiagnostics {
    /// Whether the record carries any information worth reporting.
    pub fn is_empty(&self) -> bool {
        self.procedure_code.is_none()
            && self.triggering_message.is_none()
            && self.procedure_criticality.is_none()
            && self.transaction_id.is_none()
            && self.ie_errors.is_empty()
    }

    /// Whether any per-IE errors were recorded.
    pub fn has_ie_errors(&self) -> bool {
        !self.ie_errors.is_empty()
    }
}
