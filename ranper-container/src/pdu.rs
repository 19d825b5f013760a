//! Top-level PDU entry point
//!
//! The family-standard PDU is an extensible four-alternative CHOICE; every
//! alternative carries `{procedureCode, criticality, transactionID, value}`
//! with the value wrapped in an open type. The `(message kind, procedure
//! code)` pair keys the procedure dispatch tables.

use crate::container::{decode_standard_message, MessageBody};
use crate::diagnostics::DiagnosticsBuilder;
use crate::registry::{DispatchRegistry, ProtocolNamespaces};
use bytes::Bytes;
use ranper_codec::{ChoiceIndex, PerDecoder, PerEncoder};
use ranper_core::{
    Criticality, CriticalityDiagnostics, MessageKind, PerError, PerResult, ProcedureCode,
    TransactionId,
};

/// Fully decoded PDU of one of the four standard message kinds
#[derive(Debug)]
pub struct PduMessage {
    pub message_kind: MessageKind,
    pub procedure_code: ProcedureCode,
    pub procedure_criticality: Criticality,
    pub transaction_id: TransactionId,
    pub body: PduBody,
    pub diagnostics: Option<CriticalityDiagnostics>,
}

/// Body of a decoded PDU
#[derive(Debug)]
pub enum PduBody {
    /// Decoded through a registered procedure table or the generic
    /// family-shape fallback
    Message(MessageBody),
    /// Neither a registered decoder nor the generic shape applied; raw
    /// value retained
    Unresolved(Bytes),
}

/// Result of the top-level entry point
#[derive(Debug)]
pub enum DecodedPdu {
    /// One of the four standard message kinds
    Message(PduMessage),
    /// An alternative added past the PDU's extension marker; opaque by
    /// the backward-compatibility contract
    UnknownAlternative { index: u32, data: Bytes },
}

/// Decode a transaction identifier (short or long form).
pub fn decode_transaction_id(input: &mut PerDecoder<'_>) -> PerResult<TransactionId> {
    match input.decode_choice_index(false, 2)? {
        ChoiceIndex::Root(0) => {
            TransactionId::short(input.decode_constrained_integer(0, 127)? as u8)
        }
        ChoiceIndex::Root(_) => {
            TransactionId::long(input.decode_constrained_integer(0, 32767)? as u16)
        }
        ChoiceIndex::Extension(_) => Err(PerError::InvalidData(
            "transaction id choice is not extensible".to_string(),
        )),
    }
}

/// Encode a transaction identifier.
pub fn encode_transaction_id(output: &mut PerEncoder, id: TransactionId) -> PerResult<()> {
    match id {
        TransactionId::Short(v) => {
            output.encode_choice_index(0, 2, false)?;
            output.encode_constrained_integer(i64::from(v), 0, 127)
        }
        TransactionId::Long(v) => {
            output.encode_choice_index(1, 2, false)?;
            output.encode_constrained_integer(i64::from(v), 0, 32767)
        }
    }
}

/// Decode one PDU from `bytes`.
///
/// Registered procedures decode through their table entry. For an
/// unregistered procedure the generic family shape is attempted with
/// every IE unresolved; failing that, the raw value is retained. Either
/// way the call succeeds, and the diagnostics record says what was not
/// understood. Only a malformed bitstream (or an IE with criticality
/// Reject that could not be processed) produces an error.
pub fn decode_pdu(
    bytes: &[u8],
    registry: &DispatchRegistry,
    namespaces: &ProtocolNamespaces,
) -> PerResult<DecodedPdu> {
    let mut input = PerDecoder::new(bytes);

    let message_kind = match input.decode_choice_index(true, 4)? {
        ChoiceIndex::Root(index) => MessageKind::from_choice_index(index).ok_or_else(|| {
            PerError::InvalidData(format!("pdu choice index {} out of range", index))
        })?,
        ChoiceIndex::Extension(index) => {
            let data = input.decode_open_type()?;
            log::warn!(
                "unknown pdu alternative {} retained ({} bytes)",
                index,
                data.len()
            );
            return Ok(DecodedPdu::UnknownAlternative {
                index,
                data: Bytes::from(data),
            });
        }
    };

    let procedure_code = ProcedureCode::new(input.decode_constrained_integer(0, 255)? as u8);
    let procedure_criticality =
        Criticality::from_index(input.decode_enumerated(3, None)?.index)?;
    let transaction_id = decode_transaction_id(&mut input)?;
    let payload = input.decode_open_type()?;

    let mut diagnostics = DiagnosticsBuilder::new();
    diagnostics.set_context(
        procedure_code,
        message_kind,
        procedure_criticality,
        transaction_id,
    );

    let namespace = namespaces.procedure(message_kind);
    let body = match registry.lookup_procedure(&namespace, u32::from(procedure_code.value())) {
        Some(decoder) => {
            let mut body_input = PerDecoder::new(&payload);
            PduBody::Message(decoder(&mut body_input, registry, &mut diagnostics)?)
        }
        None => {
            log::warn!(
                "no decoder registered for procedure {} in '{}', using generic shape",
                procedure_code,
                namespace
            );
            decode_generic_body(&payload, registry, namespaces, &mut diagnostics)?
        }
    };

    Ok(DecodedPdu::Message(PduMessage {
        message_kind,
        procedure_code,
        procedure_criticality,
        transaction_id,
        body,
        diagnostics: diagnostics.finish(),
    }))
}

/// Attempt the family-standard message shape on an unregistered
/// procedure's value; fall back to retaining the raw payload.
fn decode_generic_body(
    payload: &[u8],
    registry: &DispatchRegistry,
    namespaces: &ProtocolNamespaces,
    diagnostics: &mut DiagnosticsBuilder,
) -> PerResult<PduBody> {
    let mut attempt_diagnostics = DiagnosticsBuilder::new();
    let mut body_input = PerDecoder::new(payload);
    match decode_standard_message(
        &mut body_input,
        registry,
        &namespaces.ies(),
        &namespaces.extensions(),
        &[],
        &mut attempt_diagnostics,
    ) {
        Ok(body) => {
            diagnostics.absorb(attempt_diagnostics);
            Ok(PduBody::Message(body))
        }
        // the criticality rule outranks the fallback: a reject-level IE in
        // a parseable container still rejects the message
        Err(PerError::Rejected(diag)) => Err(PerError::Rejected(diag)),
        Err(err) => {
            log::debug!("generic shape did not apply: {}", err);
            Ok(PduBody::Unresolved(Bytes::copy_from_slice(payload)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::decode_protocol_ie_container;
    use crate::registry::RegistryBuilder;
    use ranper_core::{PerValue, ProtocolIeId};

    fn namespaces() -> ProtocolNamespaces {
        ProtocolNamespaces::new("test")
    }

    /// Encode `{ protocolIEs, extensions absent }` with one IE carrying a
    /// (0..255) integer payload.
    fn encode_body(entries: &[(u16, Criticality, &[u8])]) -> Vec<u8> {
        let mut enc = PerEncoder::new();
        enc.encode_sequence_header(true, false, &[false]).unwrap();
        enc.encode_constrained_integer(entries.len() as i64, 1, 65535)
            .unwrap();
        for (id, criticality, payload) in entries {
            enc.encode_constrained_integer(i64::from(*id), 0, 65535).unwrap();
            enc.encode_enumerated(criticality.index(), 3, false).unwrap();
            enc.encode_open_type(payload).unwrap();
        }
        enc.into_bytes()
    }

    fn encode_pdu_bytes(
        kind: MessageKind,
        procedure: u8,
        criticality: Criticality,
        transaction: TransactionId,
        body: &[u8],
    ) -> Vec<u8> {
        let mut enc = PerEncoder::new();
        enc.encode_choice_index(kind.choice_index(), 4, true).unwrap();
        enc.encode_constrained_integer(i64::from(procedure), 0, 255).unwrap();
        enc.encode_enumerated(criticality.index(), 3, false).unwrap();
        encode_transaction_id(&mut enc, transaction).unwrap();
        enc.encode_open_type(body).unwrap();
        enc.into_bytes()
    }

    fn registry() -> DispatchRegistry {
        let ns = namespaces();
        let mut builder = RegistryBuilder::new();
        builder.register_ie(ns.ies(), 1, |dec, _| {
            Ok(PerValue::Integer(dec.decode_constrained_integer(0, 255)?))
        });
        let ies_namespace = ns.ies();
        builder.register_procedure(ns.procedure(MessageKind::InitiatingMessage), 1, {
            move |dec, reg, diag| {
                let header = dec.decode_sequence_header(true, 1)?;
                let ies = decode_protocol_ie_container(dec, reg, &ies_namespace, &[], diag)?;
                assert!(!header.optional_present(0));
                Ok(MessageBody {
                    ies,
                    ..Default::default()
                })
            }
        });
        builder.build()
    }

    #[test]
    fn test_registered_procedure_round_trip() {
        let body = encode_body(&[(1, Criticality::Reject, &[42])]);
        let bytes = encode_pdu_bytes(
            MessageKind::InitiatingMessage,
            1,
            Criticality::Reject,
            TransactionId::Short(9),
            &body,
        );
        let registry = registry();
        let pdu = decode_pdu(&bytes, &registry, &namespaces()).unwrap();
        let message = match pdu {
            DecodedPdu::Message(m) => m,
            other => panic!("expected message, got {:?}", other),
        };
        assert_eq!(message.message_kind, MessageKind::InitiatingMessage);
        assert_eq!(message.procedure_code, ProcedureCode::new(1));
        assert_eq!(message.transaction_id, TransactionId::Short(9));
        assert!(message.diagnostics.is_none());
        match message.body {
            PduBody::Message(body) => {
                assert_eq!(body.ie(ProtocolIeId::new(1)).and_then(PerValue::as_integer), Some(42));
            }
            PduBody::Unresolved(_) => panic!("expected decoded body"),
        }
    }

    #[test]
    fn test_unregistered_procedure_generic_fallback() {
        let body = encode_body(&[(700, Criticality::Ignore, &[1, 2, 3])]);
        let bytes = encode_pdu_bytes(
            MessageKind::SuccessfulOutcome,
            200,
            Criticality::Ignore,
            TransactionId::Long(1000),
            &body,
        );
        let registry = registry();
        let pdu = decode_pdu(&bytes, &registry, &namespaces()).unwrap();
        let message = match pdu {
            DecodedPdu::Message(m) => m,
            other => panic!("expected message, got {:?}", other),
        };
        match message.body {
            PduBody::Message(body) => {
                assert_eq!(body.ies.len(), 1);
                assert!(body.ies[0].value.decoded().is_none());
            }
            PduBody::Unresolved(_) => panic!("generic shape should have applied"),
        }
    }

    #[test]
    fn test_unknown_pdu_alternative() {
        let mut enc = PerEncoder::new();
        enc.encode_choice_extension(5).unwrap();
        enc.encode_open_type(&[0xDE, 0xAD]).unwrap();
        let bytes = enc.into_bytes();
        let registry = registry();
        let pdu = decode_pdu(&bytes, &registry, &namespaces()).unwrap();
        match pdu {
            DecodedPdu::UnknownAlternative { index, data } => {
                assert_eq!(index, 5);
                assert_eq!(&data[..], &[0xDE, 0xAD]);
            }
            other => panic!("expected unknown alternative, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_pdu() {
        let body = encode_body(&[(1, Criticality::Reject, &[42])]);
        let bytes = encode_pdu_bytes(
            MessageKind::InitiatingMessage,
            1,
            Criticality::Reject,
            TransactionId::Short(9),
            &body,
        );
        // one byte short of a well-formed pdu
        let truncated = &bytes[..bytes.len() - 1];
        let registry = registry();
        let err = decode_pdu(truncated, &registry, &namespaces()).unwrap_err();
        assert!(matches!(err, PerError::Truncated { .. }));
    }

    #[test]
    fn test_rejected_ie_aborts_pdu() {
        let body = encode_body(&[(999, Criticality::Reject, &[1])]);
        let bytes = encode_pdu_bytes(
            MessageKind::InitiatingMessage,
            1,
            Criticality::Notify,
            TransactionId::Short(0),
            &body,
        );
        let registry = registry();
        let err = decode_pdu(&bytes, &registry, &namespaces()).unwrap_err();
        let diag = err.diagnostics().expect("rejection carries diagnostics");
        assert_eq!(diag.procedure_code, Some(ProcedureCode::new(1)));
        assert_eq!(diag.ie_errors[0].ie_id, ProtocolIeId::new(999));
    }

    #[test]
    fn test_transaction_id_round_trip() {
        for id in [TransactionId::Short(0), TransactionId::Short(127), TransactionId::Long(32767)] {
            let mut enc = PerEncoder::new();
            encode_transaction_id(&mut enc, id).unwrap();
            let bytes = enc.into_bytes();
            let mut dec = PerDecoder::new(&bytes);
            assert_eq!(decode_transaction_id(&mut dec).unwrap(), id);
        }
    }
}
