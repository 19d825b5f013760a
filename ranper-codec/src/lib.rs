//! Aligned PER codec primitives
//!
//! This crate implements the bit-level machinery of ITU-T X.691 (Packed
//! Encoding Rules, aligned variant): the bit cursor, scalar decoders,
//! structured decoders, and their encoding mirrors. It knows nothing about
//! any particular protocol; field layouts are driven entirely by the
//! constraints the caller passes in.

pub mod aper;

pub use aper::cursor::{BitCursor, BitWriter};
pub use aper::decoder::PerDecoder;
pub use aper::encoder::PerEncoder;
pub use aper::types::{ChoiceIndex, EnumValue, LengthForm, SequenceHeader, SizeBounds};
