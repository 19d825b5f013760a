//! Aligned PER decoder
//!
//! One `decode_*` method per X.691 form. Field layouts are supplied by the
//! caller as constraint arguments; the decoder holds no schema. All reads
//! go through the bit cursor and every loop is bounded either by a declared
//! constraint or by the remaining bit count, so corrupt counts fail with
//! `Truncated` instead of looping or allocating.

use crate::aper::cursor::BitCursor;
use crate::aper::types::{ChoiceIndex, EnumValue, LengthForm, SequenceHeader, SizeBounds};
use ranper_core::{BitString, PerError, PerResult};

/// Number of bits needed to represent `value`.
fn bits_for(value: u128) -> usize {
    (128 - value.leading_zeros()) as usize
}

/// Number of octets needed to represent `value`, at least one.
fn octets_for(value: u128) -> usize {
    bits_for(value).div_ceil(8).max(1)
}

/// Decoder for aligned PER bitstreams
#[derive(Debug)]
pub struct PerDecoder<'a> {
    cursor: BitCursor<'a>,
}

impl<'a> PerDecoder<'a> {
    /// Create a decoder over `buffer`.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            cursor: BitCursor::new(buffer),
        }
    }

    /// Create a decoder continuing from an existing cursor position.
    pub fn from_cursor(cursor: BitCursor<'a>) -> Self {
        Self { cursor }
    }

    /// Borrow the underlying cursor.
    pub fn cursor(&self) -> &BitCursor<'a> {
        &self.cursor
    }

    /// Number of unread bits.
    pub fn bits_remaining(&self) -> usize {
        self.cursor.bits_remaining()
    }

    /// Decode a BOOLEAN (one bit).
    pub fn decode_bool(&mut self) -> PerResult<bool> {
        self.cursor.read_bit("boolean")
    }

    /// Decode a constrained whole number with bounds `lower..=upper`.
    ///
    /// Aligned-variant width rules: a one-value range consumes no bits;
    /// ranges up to 255 are a minimal bit-field; range 256 is one aligned
    /// octet; ranges up to 65536 are two aligned octets; larger ranges
    /// carry a length-of-length followed by aligned minimal octets.
    pub fn decode_constrained_integer(&mut self, lower: i64, upper: i64) -> PerResult<i64> {
        const CTX: &str = "constrained whole number";
        if upper < lower {
            return Err(PerError::InvalidData(format!(
                "invalid integer bounds: lower {} above upper {}",
                lower, upper
            )));
        }
        let range = (i128::from(upper) - i128::from(lower) + 1) as u128;

        let offset: u64 = if range == 1 {
            0
        } else if range <= 255 {
            self.cursor.read_bits(bits_for(range - 1), CTX)?
        } else if range == 256 {
            self.cursor.align();
            self.cursor.read_bits(8, CTX)?
        } else if range <= 65536 {
            self.cursor.align();
            self.cursor.read_bits(16, CTX)?
        } else {
            let max_octets = octets_for(range - 1);
            let num_octets = self.decode_constrained_integer(1, max_octets as i64)? as usize;
            self.cursor.align();
            self.cursor.read_bits(num_octets * 8, CTX)?
        };

        if u128::from(offset) >= range {
            return Err(PerError::ConstraintViolation(format!(
                "decoded offset {} outside range {}..={}",
                offset, lower, upper
            )));
        }
        Ok((i128::from(lower) + i128::from(offset)) as i64)
    }

    /// Decode a semi-constrained whole number with lower bound `lower`.
    pub fn decode_semi_constrained_integer(&mut self, lower: i64) -> PerResult<i64> {
        const CTX: &str = "semi-constrained whole number";
        let len = self.decode_integer_length(CTX)?;
        let bytes = self.cursor.read_bytes(len, CTX)?;
        let mut offset: u64 = 0;
        for &b in bytes {
            offset = (offset << 8) | u64::from(b);
        }
        let value = i128::from(lower) + i128::from(offset);
        if value > i128::from(i64::MAX) {
            return Err(PerError::ConstraintViolation(format!(
                "semi-constrained value {} overflows 64 bits",
                value
            )));
        }
        Ok(value as i64)
    }

    /// Decode an unconstrained whole number (two's complement).
    pub fn decode_unconstrained_integer(&mut self) -> PerResult<i64> {
        const CTX: &str = "unconstrained whole number";
        let len = self.decode_integer_length(CTX)?;
        let bytes = self.cursor.read_bytes(len, CTX)?;
        let mut acc: u64 = if bytes[0] & 0x80 != 0 { u64::MAX } else { 0 };
        for &b in bytes {
            acc = (acc << 8) | u64::from(b);
        }
        Ok(acc as i64)
    }

    /// Length in octets of an encoded whole number (1..=8 supported).
    fn decode_integer_length(&mut self, context: &'static str) -> PerResult<usize> {
        let len = match self.decode_length_determinant(context)? {
            LengthForm::Normal(n) => n,
            LengthForm::Fragment(_) => {
                return Err(PerError::InvalidData(
                    "fragmented length on a whole number".to_string(),
                ));
            }
        };
        if len == 0 || len > 8 {
            return Err(PerError::ConstraintViolation(format!(
                "whole number of {} octets not supported",
                len
            )));
        }
        Ok(len)
    }

    /// Decode a normally-small non-negative whole number (extension
    /// indices).
    pub fn decode_normally_small_number(&mut self) -> PerResult<u64> {
        const CTX: &str = "normally small number";
        if !self.cursor.read_bit(CTX)? {
            return self.cursor.read_bits(6, CTX);
        }
        let len = self.decode_integer_length(CTX)?;
        let bytes = self.cursor.read_bytes(len, CTX)?;
        let mut value: u64 = 0;
        for &b in bytes {
            value = (value << 8) | u64::from(b);
        }
        Ok(value)
    }

    /// Decode a normally-small length (counts that are at least one, such
    /// as the number of extension additions).
    pub fn decode_normally_small_length(&mut self) -> PerResult<usize> {
        const CTX: &str = "normally small length";
        if !self.cursor.read_bit(CTX)? {
            return Ok(self.cursor.read_bits(6, CTX)? as usize + 1);
        }
        match self.decode_length_determinant(CTX)? {
            LengthForm::Normal(n) if n >= 1 => Ok(n),
            LengthForm::Normal(n) => Err(PerError::ConstraintViolation(format!(
                "normally small length {} below minimum 1",
                n
            ))),
            LengthForm::Fragment(_) => Err(PerError::InvalidData(
                "fragmented normally small length".to_string(),
            )),
        }
    }

    /// Decode one general length determinant (aligned form).
    ///
    /// Values up to 127 occupy one octet, up to 16383 two octets; larger
    /// values arrive as fragments of 16384..=65536 units that the string
    /// and sequence-of decoders concatenate until a non-fragment form.
    pub fn decode_length_determinant(&mut self, context: &'static str) -> PerResult<LengthForm> {
        self.cursor.align();
        let first = self.cursor.read_bits(8, context)? as u8;
        if first & 0x80 == 0 {
            return Ok(LengthForm::Normal(usize::from(first)));
        }
        if first & 0x40 == 0 {
            let second = self.cursor.read_bits(8, context)?;
            let len = (usize::from(first & 0x3F) << 8) | second as usize;
            return Ok(LengthForm::Normal(len));
        }
        let multiplier = usize::from(first & 0x3F);
        if multiplier == 0 || multiplier > 4 {
            return Err(PerError::InvalidData(format!(
                "invalid fragment multiplier {}",
                multiplier
            )));
        }
        Ok(LengthForm::Fragment(multiplier * 16384))
    }

    /// Decode an ENUMERATED value.
    ///
    /// `extensions` is `None` for a type without extension marker, or
    /// `Some(k)` for an extensible type whose local schema knows `k`
    /// extension values. An extension index at or past `k` decodes as an
    /// unknown value rather than failing.
    pub fn decode_enumerated(
        &mut self,
        root_count: u64,
        extensions: Option<u64>,
    ) -> PerResult<EnumValue> {
        if root_count == 0 {
            return Err(PerError::InvalidData(
                "enumerated type with empty root value set".to_string(),
            ));
        }
        if extensions.is_some() && self.cursor.read_bit("enumerated extension bit")? {
            let index = self.decode_normally_small_number()?;
            let known = extensions.is_some_and(|k| index < k);
            if !known {
                log::debug!("unknown enumerated extension index {}", index);
            }
            return Ok(EnumValue {
                index,
                extended: true,
                known,
            });
        }
        let index = self.decode_constrained_integer(0, (root_count - 1) as i64)? as u64;
        Ok(EnumValue {
            index,
            extended: false,
            known: true,
        })
    }

    /// Decode an OCTET STRING under `size`.
    pub fn decode_octet_string(&mut self, size: SizeBounds) -> PerResult<Vec<u8>> {
        const CTX: &str = "octet string";
        if let Some(n) = size.fixed_size() {
            if n < 65536 {
                let n = n as usize;
                return match n {
                    0 => Ok(Vec::new()),
                    // fixed strings of one or two octets pack unaligned
                    1 | 2 => {
                        let v = self.cursor.read_bits(n * 8, CTX)?;
                        Ok(v.to_be_bytes()[8 - n..].to_vec())
                    }
                    _ => Ok(self.cursor.read_bytes(n, CTX)?.to_vec()),
                };
            }
        } else if let Some(max) = size.max {
            if max < 65536 {
                let n = self.decode_constrained_integer(size.min as i64, max as i64)? as usize;
                if n == 0 {
                    // an empty string carries no octets and no alignment
                    return Ok(Vec::new());
                }
                return Ok(self.cursor.read_bytes(n, CTX)?.to_vec());
            }
        }

        let mut out = Vec::new();
        loop {
            match self.decode_length_determinant(CTX)? {
                LengthForm::Normal(n) => {
                    out.extend_from_slice(self.cursor.read_bytes(n, CTX)?);
                    break;
                }
                LengthForm::Fragment(n) => {
                    out.extend_from_slice(self.cursor.read_bytes(n, CTX)?);
                }
            }
        }
        size.check(out.len() as u64, "octet string")?;
        Ok(out)
    }

    /// Decode a BIT STRING under `size`.
    pub fn decode_bit_string(&mut self, size: SizeBounds) -> PerResult<BitString> {
        const CTX: &str = "bit string";
        if let Some(n) = size.fixed_size() {
            if n < 65536 {
                let n = n as usize;
                if n == 0 {
                    return Ok(BitString::empty());
                }
                // fixed strings of up to 16 bits pack unaligned
                if n > 16 {
                    self.cursor.align();
                }
                let bytes = self.cursor.read_bits_to_vec(n, CTX)?;
                return BitString::new(bytes, n);
            }
        } else if let Some(max) = size.max {
            if max < 65536 {
                let n = self.decode_constrained_integer(size.min as i64, max as i64)? as usize;
                if n == 0 {
                    return Ok(BitString::empty());
                }
                self.cursor.align();
                let bytes = self.cursor.read_bits_to_vec(n, CTX)?;
                return BitString::new(bytes, n);
            }
        }

        let mut bytes = Vec::new();
        let mut num_bits = 0usize;
        loop {
            let form = self.decode_length_determinant(CTX)?;
            let (n, done) = match form {
                LengthForm::Normal(n) => (n, true),
                LengthForm::Fragment(n) => (n, false),
            };
            if n > 0 {
                self.cursor.align();
                // fragments are whole multiples of 16384 bits, so chunks
                // concatenate cleanly on byte boundaries
                let chunk = self.cursor.read_bits_to_vec(n, CTX)?;
                bytes.extend_from_slice(&chunk);
                num_bits += n;
            }
            if done {
                break;
            }
        }
        size.check(num_bits as u64, "bit string")?;
        BitString::new(bytes, num_bits)
    }

    /// Decode a visible character string (one aligned octet per character).
    pub fn decode_visible_string(&mut self, size: SizeBounds) -> PerResult<String> {
        let bytes = self.decode_octet_string(size)?;
        String::from_utf8(bytes)
            .map_err(|e| PerError::InvalidData(format!("invalid character string: {}", e)))
    }

    /// Decode an open type: a length-prefixed, byte-aligned opaque payload.
    ///
    /// The payload is returned raw; interpreting it is the dispatch
    /// registry's job. Because the open type is self-delimiting, a caller
    /// that cannot resolve it has still consumed the correct span.
    pub fn decode_open_type(&mut self) -> PerResult<Vec<u8>> {
        self.decode_octet_string(SizeBounds::unbounded())
    }

    /// Decode a SEQUENCE preamble: the extension bit (when the type is
    /// extensible) followed by the optional-field presence bitmap.
    pub fn decode_sequence_header(
        &mut self,
        extensible: bool,
        num_optionals: usize,
    ) -> PerResult<SequenceHeader> {
        if num_optionals > 64 {
            return Err(PerError::InvalidData(format!(
                "{} optional fields exceed the supported preamble width",
                num_optionals
            )));
        }
        let extended = extensible && self.cursor.read_bit("sequence extension bit")?;
        let bitmap = if num_optionals > 0 {
            self.cursor.read_bits(num_optionals, "optional presence bitmap")?
        } else {
            0
        };
        Ok(SequenceHeader::new(extended, bitmap, num_optionals))
    }

    /// Decode the extension additions of a SEQUENCE whose extension bit
    /// was set: a normally-small slot count, a presence bitmap, and one
    /// open type per present slot.
    ///
    /// Returns raw payloads by slot position. Slots past the locally known
    /// schema are data for the caller to retain, never an error.
    pub fn decode_extension_additions(&mut self) -> PerResult<Vec<Option<Vec<u8>>>> {
        const CTX: &str = "extension addition bitmap";
        let count = self.decode_normally_small_length()?;
        let mut present = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            present.push(self.cursor.read_bit(CTX)?);
        }
        let mut slots = Vec::with_capacity(count.min(4096));
        for p in present {
            if p {
                slots.push(Some(self.decode_open_type()?));
            } else {
                slots.push(None);
            }
        }
        Ok(slots)
    }

    /// Decode a CHOICE index.
    ///
    /// Extension alternatives are announced by the extension bit and their
    /// value is wrapped in an open type, which the caller reads next; an
    /// index past the known alternatives is therefore consumable without
    /// schema knowledge.
    pub fn decode_choice_index(
        &mut self,
        extensible: bool,
        root_count: u32,
    ) -> PerResult<ChoiceIndex> {
        if extensible && self.cursor.read_bit("choice extension bit")? {
            let index = self.decode_normally_small_number()?;
            if index > u64::from(u32::MAX) {
                return Err(PerError::ConstraintViolation(format!(
                    "choice extension index {} out of range",
                    index
                )));
            }
            return Ok(ChoiceIndex::Extension(index as u32));
        }
        if root_count == 0 {
            return Err(PerError::InvalidData(
                "choice type with empty root alternative list".to_string(),
            ));
        }
        if root_count == 1 {
            return Ok(ChoiceIndex::Root(0));
        }
        let index = self.decode_constrained_integer(0, i64::from(root_count) - 1)? as u32;
        Ok(ChoiceIndex::Root(index))
    }

    /// Decode a SEQUENCE-OF: the count under `size`, then `count` calls to
    /// the element decoder.
    pub fn decode_sequence_of<T>(
        &mut self,
        size: SizeBounds,
        mut element: impl FnMut(&mut Self) -> PerResult<T>,
    ) -> PerResult<Vec<T>> {
        const CTX: &str = "sequence-of count";
        let mut out = Vec::new();

        if let Some(n) = size.fixed_size() {
            if n < 65536 {
                self.decode_elements(n as usize, &mut out, &mut element)?;
                return Ok(out);
            }
        } else if let Some(max) = size.max {
            if max < 65536 {
                let count =
                    self.decode_constrained_integer(size.min as i64, max as i64)? as usize;
                self.decode_elements(count, &mut out, &mut element)?;
                return Ok(out);
            }
        }

        loop {
            match self.decode_length_determinant(CTX)? {
                LengthForm::Normal(n) => {
                    self.decode_elements(n, &mut out, &mut element)?;
                    break;
                }
                LengthForm::Fragment(n) => {
                    self.decode_elements(n, &mut out, &mut element)?;
                }
            }
        }
        size.check(out.len() as u64, "sequence-of")?;
        Ok(out)
    }

    fn decode_elements<T>(
        &mut self,
        count: usize,
        out: &mut Vec<T>,
        element: &mut impl FnMut(&mut Self) -> PerResult<T>,
    ) -> PerResult<()> {
        // a count that cannot possibly fit the remaining input fails here,
        // before any element work or allocation proportional to it
        if count > self.cursor.bits_remaining() {
            return Err(PerError::Truncated {
                context: "sequence-of elements",
                needed_bits: count,
                available_bits: self.cursor.bits_remaining(),
                bit_offset: self.cursor.bit_offset(),
            });
        }
        out.reserve(count);
        for _ in 0..count {
            out.push(element(self)?);
        }
        Ok(())
    }
}
