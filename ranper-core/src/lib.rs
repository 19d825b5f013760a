//! Core types and utilities for the ranper signaling codec
//!
//! This crate provides the fundamental types, error handling, and decoded
//! value model used throughout the PER codec and IE framework crates.

pub mod error;
pub mod datatypes;

pub use error::{PerError, PerResult};
pub use datatypes::{
    BitString, Criticality, CriticalityDiagnostics, IeCriticalityDiagnostics, MessageKind,
    PerValue, ProcedureCode, ProtocolIeId, SequenceField, StructurePathElement, TransactionId,
    TypeOfError,
};
