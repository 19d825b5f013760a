//! Data types shared by the PER codec and the IE framework

pub mod bit_string;
pub mod criticality;
pub mod diagnostics;
pub mod ids;
pub mod per_value;

pub use bit_string::BitString;
pub use criticality::Criticality;
pub use diagnostics::{
    CriticalityDiagnostics, IeCriticalityDiagnostics, StructurePathElement, TypeOfError,
};
pub use ids::{MessageKind, ProcedureCode, ProtocolIeId, TransactionId};
pub use per_value::{PerValue, SequenceField};
