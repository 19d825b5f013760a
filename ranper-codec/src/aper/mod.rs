//! Aligned PER encoding/decoding module

pub mod cursor;
pub mod decoder;
pub mod encoder;
pub mod types;

pub use cursor::{BitCursor, BitWriter};
pub use decoder::PerDecoder;
pub use encoder::PerEncoder;
pub use types::{ChoiceIndex, EnumValue, LengthForm, SequenceHeader, SizeBounds};
