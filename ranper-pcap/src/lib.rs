//! UTRAN positioning protocol schema for the ranper engine
//!
//! This crate is the per-protocol customization point: identifier
//! constants, concrete IE codecs, and the data-driven tables that populate
//! the dispatch registry. The engine crates stay protocol-agnostic; only
//! the tables here know what the numeric keys mean.

pub mod constants;
pub mod ies;
pub mod schema;

pub use constants::PROTOCOL_PREFIX;
pub use schema::{namespaces, register, registry};
