//! Aligned PER encoder
//!
//! Mirror of the decoder, used by protocol schema crates to build messages
//! and by round-trip tests. Every `encode_*` method pairs with the
//! `decode_*` method of the same name.

use crate::aper::cursor::BitWriter;
use crate::aper::types::SizeBounds;
use ranper_core::{BitString, PerError, PerResult};

fn bits_for(value: u128) -> usize {
    (128 - value.leading_zeros()) as usize
}

fn octets_for(value: u128) -> usize {
    bits_for(value).div_ceil(8).max(1)
}

/// Minimal big-endian two's-complement image of a signed value.
fn min_signed_bytes(value: i64) -> Vec<u8> {
    let mut bytes = value.to_be_bytes().to_vec();
    while bytes.len() > 1 {
        let lead = bytes[0];
        let next_msb = bytes[1] & 0x80;
        if (lead == 0x00 && next_msb == 0) || (lead == 0xFF && next_msb != 0) {
            bytes.remove(0);
        } else {
            break;
        }
    }
    bytes
}

/// Minimal big-endian unsigned image of a value, at least one octet.
fn min_unsigned_bytes(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = (bytes.len() - 1).min(value.leading_zeros() as usize / 8);
    bytes[skip..].to_vec()
}

/// Encoder for aligned PER bitstreams
#[derive(Debug, Default)]
pub struct PerEncoder {
    writer: BitWriter,
}

impl PerEncoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bits written so far.
    pub fn bit_len(&self) -> usize {
        self.writer.bit_len()
    }

    /// Finish encoding and return the padded byte buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.writer.into_bytes()
    }

    /// Encode a BOOLEAN.
    pub fn encode_bool(&mut self, value: bool) {
        self.writer.write_bit(value);
    }

    /// Encode a constrained whole number with bounds `lower..=upper`.
    pub fn encode_constrained_integer(
        &mut self,
        value: i64,
        lower: i64,
        upper: i64,
    ) -> PerResult<()> {
        if upper < lower {
            return Err(PerError::InvalidData(format!(
                "invalid integer bounds: lower {} above upper {}",
                lower, upper
            )));
        }
        if value < lower || value > upper {
            return Err(PerError::ConstraintViolation(format!(
                "value {} outside range {}..={}",
                value, lower, upper
            )));
        }
        let range = (i128::from(upper) - i128::from(lower) + 1) as u128;
        let offset = (i128::from(value) - i128::from(lower)) as u128;

        if range == 1 {
            // single-value range occupies no bits
        } else if range <= 255 {
            self.writer.write_bits(offset as u64, bits_for(range - 1));
        } else if range == 256 {
            self.writer.align_zero();
            self.writer.write_bits(offset as u64, 8);
        } else if range <= 65536 {
            self.writer.align_zero();
            self.writer.write_bits(offset as u64, 16);
        } else {
            let max_octets = octets_for(range - 1);
            let num_octets = octets_for(offset);
            self.encode_constrained_integer(num_octets as i64, 1, max_octets as i64)?;
            self.writer.align_zero();
            self.writer.write_bits(offset as u64, num_octets * 8);
        }
        Ok(())
    }

    /// Encode a semi-constrained whole number with lower bound `lower`.
    pub fn encode_semi_constrained_integer(&mut self, value: i64, lower: i64) -> PerResult<()> {
        if value < lower {
            return Err(PerError::ConstraintViolation(format!(
                "value {} below lower bound {}",
                value, lower
            )));
        }
        let offset = (i128::from(value) - i128::from(lower)) as u128;
        let bytes = min_unsigned_bytes(offset as u64);
        self.encode_length_determinant(bytes.len())?;
        self.writer.write_bytes(&bytes);
        Ok(())
    }

    /// Encode an unconstrained whole number (two's complement).
    pub fn encode_unconstrained_integer(&mut self, value: i64) -> PerResult<()> {
        let bytes = min_signed_bytes(value);
        self.encode_length_determinant(bytes.len())?;
        self.writer.write_bytes(&bytes);
        Ok(())
    }

    /// Encode a normally-small non-negative whole number.
    pub fn encode_normally_small_number(&mut self, value: u64) -> PerResult<()> {
        if value < 64 {
            self.writer.write_bit(false);
            self.writer.write_bits(value, 6);
            return Ok(());
        }
        self.writer.write_bit(true);
        let bytes = min_unsigned_bytes(value);
        self.encode_length_determinant(bytes.len())?;
        self.writer.write_bytes(&bytes);
        Ok(())
    }

    /// Encode a normally-small length (at least one).
    pub fn encode_normally_small_length(&mut self, value: usize) -> PerResult<()> {
        if value == 0 {
            return Err(PerError::InvalidData(
                "normally small length below minimum 1".to_string(),
            ));
        }
        if value <= 64 {
            self.writer.write_bit(false);
            self.writer.write_bits((value - 1) as u64, 6);
            return Ok(());
        }
        self.writer.write_bit(true);
        self.encode_length_determinant(value)
    }

    /// Encode a non-fragment general length determinant (0..=16383).
    pub fn encode_length_determinant(&mut self, value: usize) -> PerResult<()> {
        self.writer.align_zero();
        if value <= 127 {
            self.writer.write_bits(value as u64, 8);
        } else if value <= 16383 {
            self.writer.write_bits(0x8000 | value as u64, 16);
        } else {
            return Err(PerError::InvalidData(format!(
                "length {} requires fragmentation",
                value
            )));
        }
        Ok(())
    }

    /// Write a fragment marker for `multiplier * 16384` units.
    fn write_fragment_marker(&mut self, multiplier: usize) {
        self.writer.align_zero();
        self.writer.write_bits(0xC0 | multiplier as u64, 8);
    }

    /// Encode an ENUMERATED value from the root value list.
    pub fn encode_enumerated(
        &mut self,
        index: u64,
        root_count: u64,
        extensible: bool,
    ) -> PerResult<()> {
        if index >= root_count {
            return Err(PerError::ConstraintViolation(format!(
                "enumerated index {} outside root value set of {}",
                index, root_count
            )));
        }
        if extensible {
            self.writer.write_bit(false);
        }
        self.encode_constrained_integer(index as i64, 0, (root_count - 1) as i64)
    }

    /// Encode an ENUMERATED value from the extension value list.
    pub fn encode_enumerated_extension(&mut self, index: u64) -> PerResult<()> {
        self.writer.write_bit(true);
        self.encode_normally_small_number(index)
    }

    /// Encode an OCTET STRING under `size`.
    pub fn encode_octet_string(&mut self, data: &[u8], size: SizeBounds) -> PerResult<()> {
        size.check(data.len() as u64, "octet string")?;
        if let Some(n) = size.fixed_size() {
            if n < 65536 {
                let n = n as usize;
                match n {
                    0 => {}
                    1 | 2 => {
                        for &b in data {
                            self.writer.write_bits(u64::from(b), 8);
                        }
                    }
                    _ => self.writer.write_bytes(data),
                }
                return Ok(());
            }
        } else if let Some(max) = size.max {
            if max < 65536 {
                self.encode_constrained_integer(data.len() as i64, size.min as i64, max as i64)?;
                if !data.is_empty() {
                    self.writer.write_bytes(data);
                }
                return Ok(());
            }
        }

        let mut rest = data;
        while rest.len() >= 16384 {
            let multiplier = (rest.len() / 16384).min(4);
            let chunk = multiplier * 16384;
            self.write_fragment_marker(multiplier);
            self.writer.write_bytes(&rest[..chunk]);
            rest = &rest[chunk..];
        }
        self.encode_length_determinant(rest.len())?;
        self.writer.write_bytes(rest);
        Ok(())
    }

    /// Encode a BIT STRING under `size`.
    pub fn encode_bit_string(&mut self, value: &BitString, size: SizeBounds) -> PerResult<()> {
        let n = value.num_bits();
        size.check(n as u64, "bit string")?;
        if let Some(fixed) = size.fixed_size() {
            if fixed < 65536 {
                if n == 0 {
                    return Ok(());
                }
                if n > 16 {
                    self.writer.align_zero();
                }
                self.writer.write_bits_from_slice(value.as_bytes(), n);
                return Ok(());
            }
        } else if let Some(max) = size.max {
            if max < 65536 {
                self.encode_constrained_integer(n as i64, size.min as i64, max as i64)?;
                if n > 0 {
                    self.writer.align_zero();
                    self.writer.write_bits_from_slice(value.as_bytes(), n);
                }
                return Ok(());
            }
        }

        let mut left = n;
        let mut byte_pos = 0usize;
        while left >= 16384 {
            let multiplier = (left / 16384).min(4);
            let chunk_bits = multiplier * 16384;
            self.write_fragment_marker(multiplier);
            self.writer
                .write_bits_from_slice(&value.as_bytes()[byte_pos..], chunk_bits);
            byte_pos += chunk_bits / 8;
            left -= chunk_bits;
        }
        self.encode_length_determinant(left)?;
        if left > 0 {
            self.writer.align_zero();
            self.writer
                .write_bits_from_slice(&value.as_bytes()[byte_pos..], left);
        }
        Ok(())
    }

    /// Encode a visible character string (one aligned octet per character).
    pub fn encode_visible_string(&mut self, value: &str, size: SizeBounds) -> PerResult<()> {
        self.encode_octet_string(value.as_bytes(), size)
    }

    /// Encode an open type wrapping an already-encoded payload.
    pub fn encode_open_type(&mut self, payload: &[u8]) -> PerResult<()> {
        self.encode_octet_string(payload, SizeBounds::unbounded())
    }

    /// Encode a SEQUENCE preamble.
    pub fn encode_sequence_header(
        &mut self,
        extensible: bool,
        extended: bool,
        optionals: &[bool],
    ) -> PerResult<()> {
        if extended && !extensible {
            return Err(PerError::InvalidData(
                "extension additions on a non-extensible sequence".to_string(),
            ));
        }
        if extensible {
            self.writer.write_bit(extended);
        }
        for &present in optionals {
            self.writer.write_bit(present);
        }
        Ok(())
    }

    /// Encode the extension additions of a SEQUENCE: slot count, presence
    /// bitmap, one open type per present slot.
    pub fn encode_extension_additions(&mut self, slots: &[Option<&[u8]>]) -> PerResult<()> {
        if slots.is_empty() {
            return Err(PerError::InvalidData(
                "extension additions require at least one slot".to_string(),
            ));
        }
        self.encode_normally_small_length(slots.len())?;
        for slot in slots {
            self.writer.write_bit(slot.is_some());
        }
        for slot in slots.iter().flatten() {
            self.encode_open_type(slot)?;
        }
        Ok(())
    }

    /// Encode a CHOICE index selecting a root alternative.
    pub fn encode_choice_index(
        &mut self,
        index: u32,
        root_count: u32,
        extensible: bool,
    ) -> PerResult<()> {
        if index >= root_count {
            return Err(PerError::ConstraintViolation(format!(
                "choice index {} outside {} root alternatives",
                index, root_count
            )));
        }
        if extensible {
            self.writer.write_bit(false);
        }
        if root_count > 1 {
            self.encode_constrained_integer(i64::from(index), 0, i64::from(root_count) - 1)?;
        }
        Ok(())
    }

    /// Encode a CHOICE index selecting an extension alternative. The
    /// caller wraps the alternative's value in `encode_open_type`.
    pub fn encode_choice_extension(&mut self, index: u32) -> PerResult<()> {
        self.writer.write_bit(true);
        self.encode_normally_small_number(u64::from(index))
    }

    /// Encode a SEQUENCE-OF: the count under `size`, then each element.
    pub fn encode_sequence_of<T>(
        &mut self,
        items: &[T],
        size: SizeBounds,
        mut element: impl FnMut(&mut Self, &T) -> PerResult<()>,
    ) -> PerResult<()> {
        size.check(items.len() as u64, "sequence-of")?;
        if let Some(n) = size.fixed_size() {
            if n < 65536 {
                for item in items {
                    element(self, item)?;
                }
                return Ok(());
            }
        } else if let Some(max) = size.max {
            if max < 65536 {
                self.encode_constrained_integer(
                    items.len() as i64,
                    size.min as i64,
                    max as i64,
                )?;
                for item in items {
                    element(self, item)?;
                }
                return Ok(());
            }
        }

        let mut rest = items;
        while rest.len() >= 16384 {
            let multiplier = (rest.len() / 16384).min(4);
            let chunk = multiplier * 16384;
            self.write_fragment_marker(multiplier);
            for item in &rest[..chunk] {
                element(self, item)?;
            }
            rest = &rest[chunk..];
        }
        self.encode_length_determinant(rest.len())?;
        for item in rest {
            element(self, item)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aper::decoder::PerDecoder;

    fn round_trip_constrained(value: i64, lower: i64, upper: i64) {
        let mut enc = PerEncoder::new();
        enc.encode_constrained_integer(value, lower, upper).unwrap();
        let bytes = enc.into_bytes();
        let mut dec = PerDecoder::new(&bytes);
        assert_eq!(
            dec.decode_constrained_integer(lower, upper).unwrap(),
            value,
            "round trip for {} in {}..={}",
            value,
            lower,
            upper
        );
    }

    #[test]
    fn test_constrained_round_trip_boundaries() {
        for (lower, upper) in [
            (0, 7),
            (-5, 5),
            (0, 255),
            (0, 256),
            (0, 65535),
            (1, 65536),
            (0, 16_777_215),
            (-1_000_000, 1_000_000),
            (0, 2_300_000_000_000),
        ] {
            round_trip_constrained(lower, lower, upper);
            round_trip_constrained(upper, lower, upper);
            round_trip_constrained(lower + (upper - lower) / 2, lower, upper);
        }
    }

    #[test]
    fn test_constrained_out_of_range() {
        let mut enc = PerEncoder::new();
        assert!(enc.encode_constrained_integer(8, 0, 7).is_err());
    }

    #[test]
    fn test_unconstrained_round_trip() {
        for value in [0, 1, -1, 127, 128, -128, -129, i64::MAX, i64::MIN] {
            let mut enc = PerEncoder::new();
            enc.encode_unconstrained_integer(value).unwrap();
            let bytes = enc.into_bytes();
            let mut dec = PerDecoder::new(&bytes);
            assert_eq!(dec.decode_unconstrained_integer().unwrap(), value);
        }
    }

    #[test]
    fn test_semi_constrained_round_trip() {
        for (value, lower) in [(0, 0), (1000, 1000), (1023, 1000), (1 << 40, 0)] {
            let mut enc = PerEncoder::new();
            enc.encode_semi_constrained_integer(value, lower).unwrap();
            let bytes = enc.into_bytes();
            let mut dec = PerDecoder::new(&bytes);
            assert_eq!(dec.decode_semi_constrained_integer(lower).unwrap(), value);
        }
    }

    #[test]
    fn test_normally_small_round_trip() {
        for value in [0, 17, 63, 64, 1000] {
            let mut enc = PerEncoder::new();
            enc.encode_normally_small_number(value).unwrap();
            let bytes = enc.into_bytes();
            let mut dec = PerDecoder::new(&bytes);
            assert_eq!(dec.decode_normally_small_number().unwrap(), value);
        }
    }

    #[test]
    fn test_octet_string_fragmented_round_trip() {
        // boundary sizes around the 16K fragmentation threshold
        for len in [16384usize, 16385, 32769] {
            let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let mut enc = PerEncoder::new();
            enc.encode_octet_string(&data, SizeBounds::unbounded()).unwrap();
            let bytes = enc.into_bytes();
            let mut dec = PerDecoder::new(&bytes);
            assert_eq!(dec.decode_octet_string(SizeBounds::unbounded()).unwrap(), data);
        }
    }

    #[test]
    fn test_octet_string_small_round_trip() {
        for len in [0usize, 1, 2, 3, 127, 128, 16383] {
            let data: Vec<u8> = (0..len).map(|i| (i % 253) as u8).collect();
            let mut enc = PerEncoder::new();
            enc.encode_octet_string(&data, SizeBounds::unbounded()).unwrap();
            let bytes = enc.into_bytes();
            let mut dec = PerDecoder::new(&bytes);
            assert_eq!(dec.decode_octet_string(SizeBounds::unbounded()).unwrap(), data);
        }
    }

    #[test]
    fn test_visible_string_round_trip() {
        let mut enc = PerEncoder::new();
        enc.encode_visible_string("PCAP-R99", SizeBounds::range(1, 32)).unwrap();
        let bytes = enc.into_bytes();
        let mut dec = PerDecoder::new(&bytes);
        assert_eq!(
            dec.decode_visible_string(SizeBounds::range(1, 32)).unwrap(),
            "PCAP-R99"
        );
    }

    #[test]
    fn test_bit_string_round_trip() {
        for n in [0usize, 1, 4, 16, 17, 100] {
            let bytes = vec![0xA5; n.div_ceil(8)];
            let mut padded = bytes.clone();
            if n % 8 != 0 {
                let last = padded.len() - 1;
                padded[last] &= 0xFFu8 << (8 - n % 8);
            }
            let bs = BitString::new(padded, n).unwrap();
            let mut enc = PerEncoder::new();
            enc.encode_bit_string(&bs, SizeBounds::unbounded()).unwrap();
            let out = enc.into_bytes();
            let mut dec = PerDecoder::new(&out);
            assert_eq!(dec.decode_bit_string(SizeBounds::unbounded()).unwrap(), bs);
        }
    }

    #[test]
    fn test_sequence_presence_combinations() {
        // every presence combination of three optional fields round-trips
        for mask in 0u8..8 {
            let optionals = [(mask & 4) != 0, (mask & 2) != 0, (mask & 1) != 0];
            let mut enc = PerEncoder::new();
            enc.encode_sequence_header(false, false, &optionals).unwrap();
            for (i, &present) in optionals.iter().enumerate() {
                if present {
                    enc.encode_constrained_integer(i as i64, 0, 7).unwrap();
                }
            }
            let bytes = enc.into_bytes();
            let mut dec = PerDecoder::new(&bytes);
            let hdr = dec.decode_sequence_header(false, 3).unwrap();
            for (i, &present) in optionals.iter().enumerate() {
                assert_eq!(hdr.optional_present(i), present, "mask {:03b}", mask);
                if present {
                    assert_eq!(dec.decode_constrained_integer(0, 7).unwrap(), i as i64);
                }
            }
        }
    }

    #[test]
    fn test_choice_round_trip() {
        let mut enc = PerEncoder::new();
        enc.encode_choice_index(2, 4, true).unwrap();
        enc.encode_constrained_integer(9, 0, 15).unwrap();
        let bytes = enc.into_bytes();
        let mut dec = PerDecoder::new(&bytes);
        assert_eq!(
            dec.decode_choice_index(true, 4).unwrap(),
            crate::aper::types::ChoiceIndex::Root(2)
        );
        assert_eq!(dec.decode_constrained_integer(0, 15).unwrap(), 9);
    }

    #[test]
    fn test_choice_extension_round_trip() {
        let mut enc = PerEncoder::new();
        enc.encode_choice_extension(6).unwrap();
        enc.encode_open_type(&[0xBE, 0xEF]).unwrap();
        let bytes = enc.into_bytes();
        let mut dec = PerDecoder::new(&bytes);
        assert_eq!(
            dec.decode_choice_index(true, 4).unwrap(),
            crate::aper::types::ChoiceIndex::Extension(6)
        );
        assert_eq!(dec.decode_open_type().unwrap(), vec![0xBE, 0xEF]);
    }

    #[test]
    fn test_extension_additions_round_trip() {
        let payload = [0x11u8, 0x22];
        let mut enc = PerEncoder::new();
        enc.encode_extension_additions(&[Some(&payload[..]), None, Some(&[0x33][..])])
            .unwrap();
        let bytes = enc.into_bytes();
        let mut dec = PerDecoder::new(&bytes);
        let slots = dec.decode_extension_additions().unwrap();
        assert_eq!(
            slots,
            vec![Some(vec![0x11, 0x22]), None, Some(vec![0x33])]
        );
    }

    #[test]
    fn test_sequence_of_round_trip() {
        let items: Vec<i64> = (0..300).map(|i| i % 100).collect();
        let mut enc = PerEncoder::new();
        enc.encode_sequence_of(&items, SizeBounds::unbounded(), |e, &v| {
            e.encode_constrained_integer(v, 0, 127)
        })
        .unwrap();
        let bytes = enc.into_bytes();
        let mut dec = PerDecoder::new(&bytes);
        let decoded = dec
            .decode_sequence_of(SizeBounds::unbounded(), |d| {
                d.decode_constrained_integer(0, 127)
            })
            .unwrap();
        assert_eq!(decoded, items);
    }
}
