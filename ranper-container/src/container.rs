//! Protocol IE, protocol extension and private IE containers
//!
//! Each container is an ordered list of `{id, criticality, open type}`
//! triples. The open type is consumed by length before any dispatch, so an
//! entry that cannot be resolved never corrupts the cursor for its
//! siblings; what happens to the entry itself is decided by the
//! criticality state machine.

use crate::diagnostics::{DiagnosticsBuilder, FailureDisposition};
use crate::registry::DispatchRegistry;
use bytes::Bytes;
use ranper_codec::{ChoiceIndex, PerDecoder};
use ranper_core::{Criticality, PerError, PerResult, PerValue, ProtocolIeId, TypeOfError};
use std::collections::HashMap;

/// One decoded container entry
#[derive(Debug, Clone, PartialEq)]
pub struct IeField {
    pub id: ProtocolIeId,
    pub criticality: Criticality,
    pub value: IeValue,
}

/// Decoded or retained-for-later value of a container entry
#[derive(Debug, Clone, PartialEq)]
pub enum IeValue {
    /// Resolved through the registry
    Decoded(PerValue),
    /// No decoder registered; raw payload retained so the caller can
    /// re-attempt resolution without re-parsing the message
    Unresolved(Bytes),
}

impl IeValue {
    /// Decoded value, if resolution succeeded.
    pub fn decoded(&self) -> Option<&PerValue> {
        match self {
            IeValue::Decoded(v) => Some(v),
            IeValue::Unresolved(_) => None,
        }
    }
}

/// Identifier of a private IE: a numeric local id or an encoded object
/// identifier
#[derive(Debug, Clone, PartialEq)]
pub enum PrivateIeId {
    Local(u16),
    Global(Vec<u8>),
}

/// One decoded private container entry
#[derive(Debug, Clone, PartialEq)]
pub struct PrivateIeField {
    pub id: PrivateIeId,
    pub criticality: Criticality,
    pub value: IeValue,
}

/// Body of a family-standard message: the IE container, the optional
/// extension container, and any opaque additions past the message's own
/// extension point
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageBody {
    pub ies: Vec<IeField>,
    pub extensions: Vec<IeField>,
    pub additions: Vec<PerValue>,
}

impl MessageBody {
    /// First occurrence of an IE by id, resolved values only.
    pub fn ie(&self, id: ProtocolIeId) -> Option<&PerValue> {
        self.ies
            .iter()
            .find(|f| f.id == id)
            .and_then(|f| f.value.decoded())
    }
}

/// Shared entry loop of the IE and extension containers.
fn decode_ie_entries(
    input: &mut PerDecoder<'_>,
    registry: &DispatchRegistry,
    namespace: &str,
    diagnostics: &mut DiagnosticsBuilder,
) -> PerResult<Vec<IeField>> {
    let count = input.decode_constrained_integer(1, 65535)? as usize;
    let mut fields = Vec::new();
    let mut repetitions: HashMap<u16, u32> = HashMap::new();

    for _ in 0..count {
        let id = ProtocolIeId::new(input.decode_constrained_integer(0, 65535)? as u16);
        let criticality = Criticality::from_index(input.decode_enumerated(3, None)?.index)?;
        let payload = input.decode_open_type()?;
        let repetition = {
            let slot = repetitions.entry(id.value()).or_insert(0);
            let current = *slot;
            *slot += 1;
            current
        };

        match registry.lookup_ie(namespace, u32::from(id.value())) {
            Some(decoder) => {
                let mut payload_input = PerDecoder::new(&payload);
                match decoder(&mut payload_input, registry) {
                    Ok(value) => fields.push(IeField {
                        id,
                        criticality,
                        value: IeValue::Decoded(value),
                    }),
                    // a rejection from a nested container propagates as-is
                    Err(PerError::Rejected(diag)) => return Err(PerError::Rejected(diag)),
                    Err(err) => {
                        log::warn!("failed to decode IE {} in '{}': {}", id, namespace, err);
                        match FailureDisposition::for_criticality(criticality) {
                            FailureDisposition::Abort => {
                                return Err(diagnostics.reject(
                                    criticality,
                                    id,
                                    Some(repetition),
                                    TypeOfError::NotUnderstood,
                                ));
                            }
                            FailureDisposition::Continue { record } => {
                                if record {
                                    diagnostics.record_not_understood(
                                        criticality,
                                        id,
                                        Some(repetition),
                                    );
                                }
                                // a payload that failed mid-decode has no
                                // trustworthy value; the field is dropped
                            }
                        }
                    }
                }
            }
            None => {
                log::warn!(
                    "no decoder registered for IE {} in '{}', {} bytes retained",
                    id,
                    namespace,
                    payload.len()
                );
                match FailureDisposition::for_criticality(criticality) {
                    FailureDisposition::Abort => {
                        return Err(diagnostics.reject(
                            criticality,
                            id,
                            Some(repetition),
                            TypeOfError::NotUnderstood,
                        ));
                    }
                    FailureDisposition::Continue { record } => {
                        if record {
                            diagnostics.record_not_understood(criticality, id, Some(repetition));
                        }
                        fields.push(IeField {
                            id,
                            criticality,
                            value: IeValue::Unresolved(Bytes::from(payload)),
                        });
                    }
                }
            }
        }
    }
    Ok(fields)
}

/// Decode a ProtocolIE-Container and check mandatory presence.
///
/// `required` lists the IEs the message schema declares mandatory, each
/// with the criticality to apply if it is absent.
pub fn decode_protocol_ie_container(
    input: &mut PerDecoder<'_>,
    registry: &DispatchRegistry,
    namespace: &str,
    required: &[(ProtocolIeId, Criticality)],
    diagnostics: &mut DiagnosticsBuilder,
) -> PerResult<Vec<IeField>> {
    let fields = decode_ie_entries(input, registry, namespace, diagnostics)?;
    for &(id, criticality) in required {
        if !fields.iter().any(|f| f.id == id) {
            log::warn!("mandatory IE {} absent from '{}'", id, namespace);
            match FailureDisposition::for_criticality(criticality) {
                FailureDisposition::Abort => {
                    return Err(diagnostics.reject(criticality, id, None, TypeOfError::Missing));
                }
                FailureDisposition::Continue { record } => {
                    if record {
                        diagnostics.record_missing(criticality, id);
                    }
                }
            }
        }
    }
    Ok(fields)
}

/// Decode a ProtocolExtensionContainer.
///
/// Structurally identical to the IE container; reserved for additions made
/// after a message's extension point was frozen, so nothing is mandatory.
pub fn decode_protocol_extension_container(
    input: &mut PerDecoder<'_>,
    registry: &DispatchRegistry,
    namespace: &str,
    diagnostics: &mut DiagnosticsBuilder,
) -> PerResult<Vec<IeField>> {
    decode_ie_entries(input, registry, namespace, diagnostics)
}

/// Decode a PrivateIE-Container.
///
/// Private ids may be local numbers or encoded object identifiers; only
/// local ids can hit the registry, global ones are always retained raw.
pub fn decode_private_ie_container(
    input: &mut PerDecoder<'_>,
    registry: &DispatchRegistry,
    namespace: &str,
    diagnostics: &mut DiagnosticsBuilder,
) -> PerResult<Vec<PrivateIeField>> {
    let count = input.decode_constrained_integer(1, 65535)? as usize;
    let mut fields = Vec::new();

    for _ in 0..count {
        let id = match input.decode_choice_index(false, 2)? {
            ChoiceIndex::Root(0) => {
                PrivateIeId::Local(input.decode_constrained_integer(0, 65535)? as u16)
            }
            ChoiceIndex::Root(_) => PrivateIeId::Global(input.decode_open_type()?),
            ChoiceIndex::Extension(_) => {
                return Err(PerError::InvalidData(
                    "private IE id choice is not extensible".to_string(),
                ));
            }
        };
        let criticality = Criticality::from_index(input.decode_enumerated(3, None)?.index)?;
        let payload = input.decode_open_type()?;

        let resolved = match &id {
            PrivateIeId::Local(local) => registry
                .lookup_ie(namespace, u32::from(*local))
                .map(|decoder| {
                    let mut payload_input = PerDecoder::new(&payload);
                    decoder(&mut payload_input, registry)
                }),
            PrivateIeId::Global(_) => None,
        };

        match resolved {
            Some(Ok(value)) => fields.push(PrivateIeField {
                id,
                criticality,
                value: IeValue::Decoded(value),
            }),
            Some(Err(PerError::Rejected(diag))) => return Err(PerError::Rejected(diag)),
            Some(Err(err)) => {
                log::warn!("failed to decode private IE in '{}': {}", namespace, err);
                match FailureDisposition::for_criticality(criticality) {
                    FailureDisposition::Abort => {
                        let report_id = match id {
                            PrivateIeId::Local(local) => ProtocolIeId::new(local),
                            PrivateIeId::Global(_) => ProtocolIeId::new(0),
                        };
                        return Err(diagnostics.reject(
                            criticality,
                            report_id,
                            None,
                            TypeOfError::NotUnderstood,
                        ));
                    }
                    FailureDisposition::Continue { record } => {
                        if record {
                            if let PrivateIeId::Local(local) = id {
                                diagnostics.record_not_understood(
                                    criticality,
                                    ProtocolIeId::new(local),
                                    None,
                                );
                            }
                        }
                    }
                }
            }
            None => {
                // private material is expected to be opaque to most peers;
                // retain it without applying the reject rule
                fields.push(PrivateIeField {
                    id,
                    criticality,
                    value: IeValue::Unresolved(Bytes::from(payload)),
                });
            }
        }
    }
    Ok(fields)
}

/// Decode the family-standard message shape: an extensible SEQUENCE of a
/// ProtocolIE-Container and an optional ProtocolExtensionContainer.
pub fn decode_standard_message(
    input: &mut PerDecoder<'_>,
    registry: &DispatchRegistry,
    ies_namespace: &str,
    extensions_namespace: &str,
    required: &[(ProtocolIeId, Criticality)],
    diagnostics: &mut DiagnosticsBuilder,
) -> PerResult<MessageBody> {
    let header = input.decode_sequence_header(true, 1)?;
    let ies =
        decode_protocol_ie_container(input, registry, ies_namespace, required, diagnostics)?;
    let extensions = if header.optional_present(0) {
        decode_protocol_extension_container(input, registry, extensions_namespace, diagnostics)?
    } else {
        Vec::new()
    };
    let mut additions = Vec::new();
    if header.extended {
        for (slot, payload) in input.decode_extension_additions()?.into_iter().enumerate() {
            if let Some(data) = payload {
                log::debug!(
                    "retaining unknown message extension addition in slot {} ({} bytes)",
                    slot,
                    data.len()
                );
                additions.push(PerValue::Unknown {
                    key: Some(slot as u32),
                    data,
                });
            }
        }
    }
    Ok(MessageBody {
        ies,
        extensions,
        additions,
    })
}
