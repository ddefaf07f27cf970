//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cmp::Ordering;
use std::fmt::Write as _;

use bytes::{Buf, BufMut, Bytes, BytesMut, TryGetError};
use serde::{Deserialize, Serialize};

use crate::bytes::{BytesExt, BytesMutExt, varnum_len};

// NDN TLV type numbers for names.
pub const TLV_NAME: u64 = 0x07;
pub const TLV_NAME_COMPONENT: u64 = 0x08;

/// Hierarchical NDN name.
///
/// An ordered sequence of length-prefixed byte components supporting
/// equality, canonical ordering and prefix match. Canonical ordering
/// compares names component by component, and components first by length
/// and then lexicographically by octets.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct Name {
    components: Vec<NameComponent>,
}

/// Single name component (opaque byte string).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct NameComponent(Vec<u8>);

// Name decoding errors.
#[derive(Debug)]
pub enum NameDecodeError {
    ReadOutOfBounds,
    UnexpectedType(u64),
    InvalidLength(u64),
}

// Name URI parsing errors.
#[derive(Debug)]
pub struct InvalidNameUri(pub String);

// ===== impl Name =====

impl Name {
    /// Returns the number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns an iterator over the name components.
    pub fn components(&self) -> impl Iterator<Item = &NameComponent> + '_ {
        self.components.iter()
    }

    pub fn get(&self, index: usize) -> Option<&NameComponent> {
        self.components.get(index)
    }

    /// Appends a component in place.
    pub fn push(&mut self, component: NameComponent) {
        self.components.push(component);
    }

    /// Returns a copy of the name with one UTF-8 component appended.
    pub fn append(&self, component: &str) -> Name {
        let mut name = self.clone();
        name.push(NameComponent::from(component));
        name
    }

    /// Returns a copy of the name with a NonNegativeInteger component
    /// appended.
    pub fn append_number(&self, number: u64) -> Name {
        let mut name = self.clone();
        name.push(NameComponent::from_number(number));
        name
    }

    /// Returns a copy of the name with all of `other`'s components appended.
    pub fn concat(&self, other: &Name) -> Name {
        let mut name = self.clone();
        name.components.extend(other.components.iter().cloned());
        name
    }

    /// Returns the sub-name starting at the given component index.
    pub fn sub_name(&self, from: usize) -> Name {
        Name {
            components: self
                .components
                .get(from..)
                .unwrap_or_default()
                .to_vec(),
        }
    }

    /// Tests whether `self` is a prefix of `other`.
    ///
    /// Every name is a prefix of itself, and the empty name is a prefix of
    /// every name.
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.components.len() <= other.components.len()
            && self
                .components
                .iter()
                .zip(other.components.iter())
                .all(|(a, b)| a == b)
    }

    /// Returns the length of the encoded Name TLV.
    pub fn encoded_len(&self) -> usize {
        let payload = self.payload_len();
        varnum_len(TLV_NAME) + varnum_len(payload as u64) + payload
    }

    fn payload_len(&self) -> usize {
        self.components
            .iter()
            .map(|component| {
                varnum_len(TLV_NAME_COMPONENT)
                    + varnum_len(component.0.len() as u64)
                    + component.0.len()
            })
            .sum()
    }

    /// Encodes the name as a Name TLV.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_varnum(TLV_NAME);
        buf.put_varnum(self.payload_len() as u64);
        for component in &self.components {
            buf.put_varnum(TLV_NAME_COMPONENT);
            buf.put_varnum(component.0.len() as u64);
            buf.put_slice(&component.0);
        }
    }

    /// Decodes a Name TLV from the buffer.
    pub fn decode(buf: &mut Bytes) -> Result<Name, NameDecodeError> {
        let tlv_type = buf.try_get_varnum()?;
        if tlv_type != TLV_NAME {
            return Err(NameDecodeError::UnexpectedType(tlv_type));
        }
        let tlv_len = buf.try_get_varnum()?;
        if tlv_len > buf.remaining() as u64 {
            return Err(NameDecodeError::InvalidLength(tlv_len));
        }
        let mut buf_name = buf.split_to(tlv_len as usize);

        let mut components = vec![];
        while buf_name.remaining() > 0 {
            let comp_type = buf_name.try_get_varnum()?;
            if comp_type != TLV_NAME_COMPONENT {
                return Err(NameDecodeError::UnexpectedType(comp_type));
            }
            let comp_len = buf_name.try_get_varnum()?;
            if comp_len > buf_name.remaining() as u64 {
                return Err(NameDecodeError::InvalidLength(comp_len));
            }
            let bytes = buf_name.split_to(comp_len as usize);
            components.push(NameComponent(bytes.to_vec()));
        }

        Ok(Name { components })
    }

    /// Parses a name from its URI representation (e.g. `/ndn/site/router`).
    pub fn from_uri(uri: &str) -> Result<Name, InvalidNameUri> {
        let trimmed = uri.strip_prefix('/').unwrap_or(uri);
        let mut components = vec![];
        if !trimmed.is_empty() {
            for part in trimmed.split('/') {
                if part.is_empty() {
                    return Err(InvalidNameUri(uri.to_owned()));
                }
                components.push(NameComponent::from_escaped(part)?);
            }
        }
        Ok(Name { components })
    }
}

impl std::str::FromStr for Name {
    type Err = InvalidNameUri;

    fn from_str(s: &str) -> Result<Name, InvalidNameUri> {
        Name::from_uri(s)
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for component in &self.components {
            write!(f, "/{component}")?;
        }
        Ok(())
    }
}

// ===== impl NameComponent =====

impl NameComponent {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Creates a NonNegativeInteger component (minimal 1/2/4/8 octet
    /// big-endian encoding).
    pub fn from_number(number: u64) -> NameComponent {
        let bytes = if number <= u8::MAX as u64 {
            vec![number as u8]
        } else if number <= u16::MAX as u64 {
            (number as u16).to_be_bytes().to_vec()
        } else if number <= u32::MAX as u64 {
            (number as u32).to_be_bytes().to_vec()
        } else {
            number.to_be_bytes().to_vec()
        };
        NameComponent(bytes)
    }

    // Parses one percent-escaped URI component.
    fn from_escaped(s: &str) -> Result<NameComponent, InvalidNameUri> {
        let mut bytes = vec![];
        let mut chars = s.bytes();
        while let Some(c) = chars.next() {
            if c == b'%' {
                let hi = chars.next().ok_or_else(|| InvalidNameUri(s.into()))?;
                let lo = chars.next().ok_or_else(|| InvalidNameUri(s.into()))?;
                let hex = [hi, lo];
                let hex = std::str::from_utf8(&hex)
                    .ok()
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                    .ok_or_else(|| InvalidNameUri(s.into()))?;
                bytes.push(hex);
            } else {
                bytes.push(c);
            }
        }
        Ok(NameComponent(bytes))
    }
}

impl From<&str> for NameComponent {
    fn from(s: &str) -> NameComponent {
        NameComponent(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for NameComponent {
    fn from(bytes: Vec<u8>) -> NameComponent {
        NameComponent(bytes)
    }
}

impl Ord for NameComponent {
    // NDN canonical order: shorter components sort first, equal-length
    // components compare bytewise.
    fn cmp(&self, other: &NameComponent) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for NameComponent {
    fn partial_cmp(&self, other: &NameComponent) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for NameComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &byte in &self.0 {
            match byte {
                b'A'..=b'Z'
                | b'a'..=b'z'
                | b'0'..=b'9'
                | b'-'
                | b'.'
                | b'_'
                | b'~' => f.write_char(byte as char)?,
                _ => write!(f, "%{byte:02X}")?,
            }
        }
        Ok(())
    }
}

// ===== impl NameDecodeError =====

impl std::fmt::Display for NameDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameDecodeError::ReadOutOfBounds => {
                write!(f, "attempt to read out of bounds")
            }
            NameDecodeError::UnexpectedType(tlv_type) => {
                write!(f, "unexpected TLV type: {tlv_type}")
            }
            NameDecodeError::InvalidLength(tlv_len) => {
                write!(f, "invalid TLV length: {tlv_len}")
            }
        }
    }
}

impl std::error::Error for NameDecodeError {}

impl From<TryGetError> for NameDecodeError {
    fn from(_error: TryGetError) -> NameDecodeError {
        NameDecodeError::ReadOutOfBounds
    }
}

// ===== impl InvalidNameUri =====

impl std::fmt::Display for InvalidNameUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid name URI: {}", self.0)
    }
}

impl std::error::Error for InvalidNameUri {}

// ===== unit tests =====
