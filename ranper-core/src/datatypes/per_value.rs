//! Decoded value tree
//!
//! Every decoder in the codec and container crates produces values of this
//! shape. Unresolved open types and unknown extension material are carried
//! as [`PerValue::Unknown`] with their raw bytes so a caller can re-attempt
//! resolution later without re-parsing the message.

use crate::datatypes::bit_string::BitString;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// One named member of a decoded SEQUENCE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceField {
    /// Field name from the schema
    pub name: Cow<'static, str>,
    /// Decoded field value
    pub value: PerValue,
}

impl SequenceField {
    /// Create a named field.
    pub fn new(name: impl Into<Cow<'static, str>>, value: PerValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Container for any value the PER decoders can produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PerValue {
    /// NULL
    Null,
    /// BOOLEAN
    Boolean(bool),
    /// Whole number (constrained, semi-constrained or unconstrained)
    Integer(i64),
    /// ENUMERATED value
    ///
    /// `known` is false when the index selected an extension value the
    /// local schema does not list; extensibility exists precisely so such
    /// values decode instead of failing.
    Enumerated {
        index: u64,
        extended: bool,
        known: bool,
    },
    /// BIT STRING
    BitString(BitString),
    /// OCTET STRING
    OctetString(#[serde(with = "serde_bytes")] Vec<u8>),
    /// Character string carried as octets of visible characters
    VisibleString(String),
    /// SEQUENCE with named members in declaration order
    Sequence(Vec<SequenceField>),
    /// SEQUENCE OF / SET OF
    SequenceOf(Vec<PerValue>),
    /// CHOICE with the selected alternative
    Choice {
        index: u32,
        extended: bool,
        value: Box<PerValue>,
    },
    /// Material that could not be resolved against the local schema:
    /// an unregistered open type, an unknown choice alternative, or an
    /// extension addition past the known slots. `key` is the numeric id
    /// that failed to resolve, when one exists.
    Unknown {
        key: Option<u32>,
        #[serde(with = "serde_bytes")]
        data: Vec<u8>,
    },
}

impl PerValue {
    /// Whole-number value, if this is an Integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PerValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean value, if this is a Boolean.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PerValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Octet string contents, if this is an OctetString.
    pub fn as_octet_string(&self) -> Option<&[u8]> {
        match self {
            PerValue::OctetString(v) => Some(v),
            _ => None,
        }
    }

    /// Bit string value, if this is a BitString.
    pub fn as_bit_string(&self) -> Option<&BitString> {
        match self {
            PerValue::BitString(v) => Some(v),
            _ => None,
        }
    }

    /// Sequence members, if this is a Sequence.
    pub fn as_sequence(&self) -> Option<&[SequenceField]> {
        match self {
            PerValue::Sequence(fields) => Some(fields),
            _ => None,
        }
    }

    /// Elements, if this is a SequenceOf.
    pub fn as_sequence_of(&self) -> Option<&[PerValue]> {
        match self {
            PerValue::SequenceOf(items) => Some(items),
            _ => None,
        }
    }

    /// Enumerated index, if this is an Enumerated.
    pub fn as_enumerated(&self) -> Option<u64> {
        match self {
            PerValue::Enumerated { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Selected alternative, if this is a Choice.
    pub fn as_choice(&self) -> Option<(u32, &PerValue)> {
        match self {
            PerValue::Choice { index, value, .. } => Some((*index, value)),
            _ => None,
        }
    }

    /// Whether this value (or the choice it wraps) is unresolved material.
    pub fn is_unknown(&self) -> bool {
        match self {
            PerValue::Unknown { .. } => true,
            PerValue::Choice { value, .. } => value.is_unknown(),
            _ => false,
        }
    }

    /// Look up a sequence member by name.
    pub fn field(&self, name: &str) -> Option<&PerValue> {
        self.as_sequence()?
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }
}
