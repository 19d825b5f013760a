//! Extensible IE container framework
//!
//! The layer between the raw PER codec and a concrete protocol schema:
//! open-type dispatch by numeric key, the three protocol containers
//! (IE, extension, private), the criticality state machine with its
//! diagnostics builder, and the top-level PDU entry point.

pub mod container;
pub mod diagnostics;
pub mod pdu;
pub mod registry;

pub use container::{
    decode_private_ie_container, decode_protocol_extension_container,
    decode_protocol_ie_container, decode_standard_message, IeField, IeValue, MessageBody,
    PrivateIeField, PrivateIeId,
};
pub use diagnostics::{DiagnosticsBuilder, FailureDisposition};
pub use pdu::{
    decode_pdu, decode_transaction_id, encode_transaction_id, DecodedPdu, PduBody, PduMessage,
};
pub use registry::{
    DispatchRegistry, IeDecodeFn, ProcedureDecodeFn, ProtocolNamespaces, RegistryBuilder,
};
