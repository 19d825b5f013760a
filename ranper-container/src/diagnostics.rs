//! Criticality state machine and diagnostics builder
//!
//! Every protocol in this family applies the same three-way rule when an
//! IE cannot be processed, so the rule lives here once: Reject aborts the
//! enclosing message, Ignore drops the IE silently, Notify drops the IE
//! and records it for the peer.

use ranper_core::{
    Criticality, CriticalityDiagnostics, IeCriticalityDiagnostics, MessageKind, PerError,
    ProcedureCode, ProtocolIeId, TransactionId, TypeOfError,
};

/// What the container loop does after an IE-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Skip the IE and keep decoding siblings; `record` selects whether a
    /// diagnostics entry is appended
    Continue { record: bool },
    /// Abort the enclosing message
    Abort,
}

impl FailureDisposition {
    /// The family-wide criticality rule.
    pub fn for_criticality(criticality: Criticality) -> Self {
        match criticality {
            Criticality::Reject => FailureDisposition::Abort,
            Criticality::Ignore => FailureDisposition::Continue { record: false },
            Criticality::Notify => FailureDisposition::Continue { record: true },
        }
    }
}

/// Accumulates a [`CriticalityDiagnostics`] record while one message
/// decodes
#[derive(Debug, Default)]
pub struct DiagnosticsBuilder {
    diag: CriticalityDiagnostics,
}

impl DiagnosticsBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the PDU header context once it is known.
    pub fn set_context(
        &mut self,
        procedure_code: ProcedureCode,
        triggering_message: MessageKind,
        procedure_criticality: Criticality,
        transaction_id: TransactionId,
    ) {
        self.diag.procedure_code = Some(procedure_code);
        self.diag.triggering_message = Some(triggering_message);
        self.diag.procedure_criticality = Some(procedure_criticality);
        self.diag.transaction_id = Some(transaction_id);
    }

    /// Record an IE that was present but not understood.
    pub fn record_not_understood(
        &mut self,
        criticality: Criticality,
        ie_id: ProtocolIeId,
        repetition_number: Option<u32>,
    ) {
        self.diag.ie_errors.push(IeCriticalityDiagnostics {
            criticality,
            ie_id,
            repetition_number,
            message_structure: None,
            type_of_error: TypeOfError::NotUnderstood,
        });
    }

    /// Record a mandatory IE that was absent.
    pub fn record_missing(&mut self, criticality: Criticality, ie_id: ProtocolIeId) {
        self.diag.ie_errors.push(IeCriticalityDiagnostics {
            criticality,
            ie_id,
            repetition_number: None,
            message_structure: None,
            type_of_error: TypeOfError::Missing,
        });
    }

    /// Move another builder's IE entries into this one.
    pub fn absorb(&mut self, other: DiagnosticsBuilder) {
        self.diag.ie_errors.extend(other.diag.ie_errors);
    }

    /// Build the rejection error for an IE with criticality Reject.
    ///
    /// The returned record describes exactly the offending IE, on top of
    /// whatever header context is already set.
    pub fn reject(
        &self,
        criticality: Criticality,
        ie_id: ProtocolIeId,
        repetition_number: Option<u32>,
        type_of_error: TypeOfError,
    ) -> PerError {
        let mut diag = CriticalityDiagnostics {
            procedure_code: self.diag.procedure_code,
            triggering_message: self.diag.triggering_message,
            procedure_criticality: self.diag.procedure_criticality,
            transaction_id: self.diag.transaction_id,
            ie_errors: Vec::new(),
        };
        diag.ie_errors.push(IeCriticalityDiagnostics {
            criticality,
            ie_id,
            repetition_number,
            message_structure: None,
            type_of_error,
        });
        PerError::Rejected(Box::new(diag))
    }

    /// Whether any IE entries have been recorded.
    pub fn has_entries(&self) -> bool {
        self.diag.has_ie_errors()
    }

    /// Finish the record; `None` when nothing was recorded.
    pub fn finish(self) -> Option<CriticalityDiagnostics> {
        if self.diag.has_ie_errors() {
            Some(self.diag)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_rule() {
        assert_eq!(
            FailureDisposition::for_criticality(Criticality::Reject),
            FailureDisposition::Abort
        );
        assert_eq!(
            FailureDisposition::for_criticality(Criticality::Ignore),
            FailureDisposition::Continue { record: false }
        );
        assert_eq!(
            FailureDisposition::for_criticality(Criticality::Notify),
            FailureDisposition::Continue { record: true }
        );
    }

    #[test]
    fn test_finish_empty_is_none() {
        assert!(DiagnosticsBuilder::new().finish().is_none());
    }

    #[test]
    fn test_reject_describes_single_ie() {
        let mut builder = DiagnosticsBuilder::new();
        builder.record_not_understood(Criticality::Notify, ProtocolIeId::new(7), None);
        let err = builder.reject(
            Criticality::Reject,
            ProtocolIeId::new(12),
            Some(0),
            TypeOfError::NotUnderstood,
        );
        let diag = err.diagnostics().expect("rejection carries diagnostics");
        assert_eq!(diag.ie_errors.len(), 1);
        assert_eq!(diag.ie_errors[0].ie_id, ProtocolIeId::new(12));
    }

    #[test]
    fn test_context_round_trip() {
        let mut builder = DiagnosticsBuilder::new();
        builder.set_context(
            ProcedureCode::new(1),
            MessageKind::InitiatingMessage,
            Criticality::Reject,
            TransactionId::Short(9),
        );
        builder.record_missing(Criticality::Notify, ProtocolIeId::new(3));
        let diag = builder.finish().unwrap();
        assert_eq!(diag.procedure_code, Some(ProcedureCode::new(1)));
        assert_eq!(diag.ie_errors[0].type_of_error, TypeOfError::Missing);
    }
}
