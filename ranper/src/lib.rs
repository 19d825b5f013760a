//! ranper - Aligned PER codec and IE dispatch framework for RAN signaling
//!
//! This library implements the generic decoding engine shared by the
//! 3GPP-style application protocols: an X.691 aligned-variant PER codec
//! and the criticality-aware IE container framework built on top of it,
//! with protocol knowledge supplied as data-driven schema tables.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `ranper-core`: Core types, error handling, and the decoded value model
//! - `ranper-codec`: X.691 aligned PER primitives (cursor, decoder, encoder)
//! - `ranper-container`: IE containers, open-type dispatch registry,
//!   criticality diagnostics, top-level PDU entry point
//! - `ranper-pcap`: schema tables for the UTRAN positioning protocol
//!
//! # Usage
//!
//! ```no_run
//! use ranper::container::decode_pdu;
//!
//! let registry = ranper::pcap::registry();
//! let namespaces = ranper::pcap::namespaces();
//! let capture: &[u8] = &[/* one PDU from an SCCP payload */];
//! match decode_pdu(capture, &registry, &namespaces) {
//!     Ok(pdu) => println!("{:?}", pdu),
//!     Err(err) => eprintln!("decode failed: {}", err),
//! }
//! ```

// Re-export core types
pub use ranper_core::{PerError, PerResult};
pub use ranper_core::datatypes::*;

// Re-export the codec primitives
pub mod codec {
    pub use ranper_codec::*;
}

// Re-export the container framework
pub mod container {
    pub use ranper_container::*;
}

// Re-export the positioning protocol schema
pub mod pcap {
    pub use ranper_pcap::*;
}
