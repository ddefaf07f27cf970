//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(clippy::len_without_is_empty)]

use bytes::{Buf, BufMut, Bytes, BytesMut};
use derive_new::new;
use nlsr_utils::bytes::{BytesExt, BytesMutExt, varnum_len};
use nlsr_utils::name::Name;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::packet::consts::TlvType;
use crate::packet::error::{DecodeError, DecodeResult};

// Trait for all TLVs.
pub trait Tlv {
    // Return the full length of the TLV, header included.
    fn len(&self) -> usize;
}

// List of name prefixes in canonical order.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct NamePrefixListTlv {
    pub list: Vec<Name>,
}

// Single advertised adjacency.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct Adjacency {
    pub neighbor: Name,
    pub face_uri: String,
    pub cost: u64,
}

// List of adjacencies advertised by an AdjacencyLSA.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct AdjacencyListTlv {
    pub list: Vec<Adjacency>,
}

// ===== helper functions =====

pub(crate) fn tlv_encode_hdr(
    buf: &mut BytesMut,
    tlv_type: TlvType,
    payload_len: usize,
) {
    buf.put_varnum(tlv_type.to_u64().unwrap());
    buf.put_varnum(payload_len as u64);
}

// Returns the full length of a TLV with the given payload length.
pub(crate) fn tlv_len(tlv_type: TlvType, payload_len: usize) -> usize {
    varnum_len(tlv_type.to_u64().unwrap())
        + varnum_len(payload_len as u64)
        + payload_len
}

// Reads a TLV header of the expected type and returns its payload.
pub(crate) fn tlv_expect(
    buf: &mut Bytes,
    expected: TlvType,
) -> DecodeResult<Bytes> {
    let tlv_type = buf.try_get_varnum()?;
    if tlv_type != expected.to_u64().unwrap() {
        return Err(DecodeError::UnexpectedType(tlv_type));
    }
    let tlv_len = buf.try_get_varnum()?;
    if tlv_len > buf.remaining() as u64 {
        return Err(DecodeError::InvalidLength(tlv_len));
    }
    Ok(buf.split_to(tlv_len as usize))
}

// Returns the payload length of a NonNegativeInteger (1, 2, 4 or 8 octets).
pub(crate) const fn nni_len(value: u64) -> usize {
    if value <= u8::MAX as u64 {
        1
    } else if value <= u16::MAX as u64 {
        2
    } else if value <= u32::MAX as u64 {
        4
    } else {
        8
    }
}

// Encodes a NonNegativeInteger TLV.
pub(crate) fn nni_encode(buf: &mut BytesMut, tlv_type: TlvType, value: u64) {
    tlv_encode_hdr(buf, tlv_type, nni_len(value));
    match nni_len(value) {
        1 => buf.put_u8(value as u8),
        2 => buf.put_u16(value as u16),
        4 => buf.put_u32(value as u32),
        _ => buf.put_u64(value),
    }
}

// Decodes a NonNegativeInteger TLV of the expected type.
pub(crate) fn nni_decode(
    buf: &mut Bytes,
    expected: TlvType,
) -> DecodeResult<u64> {
    let mut payload = tlv_expect(buf, expected)?;
    match payload.len() {
        1 => Ok(payload.get_u8().into()),
        2 => Ok(payload.get_u16().into()),
        4 => Ok(payload.get_u32().into()),
        8 => Ok(payload.get_u64()),
        len => Err(DecodeError::InvalidLength(len as u64)),
    }
}

// Encodes an 8-octet IEEE 754 double TLV.
pub(crate) fn double_encode(buf: &mut BytesMut, tlv_type: TlvType, value: f64) {
    tlv_encode_hdr(buf, tlv_type, 8);
    buf.put_f64(value);
}

// Decodes an 8-octet IEEE 754 double TLV of the expected type.
pub(crate) fn double_decode(
    buf: &mut Bytes,
    expected: TlvType,
) -> DecodeResult<f64> {
    let mut payload = tlv_expect(buf, expected)?;
    if payload.len() != 8 {
        return Err(DecodeError::InvalidLength(payload.len() as u64));
    }
    Ok(payload.get_f64())
}

// ===== impl NamePrefixListTlv =====

impl NamePrefixListTlv {
    pub(crate) fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let mut payload = tlv_expect(buf, TlvType::NamePrefixList)?;

        let mut list = vec![];
        while payload.remaining() > 0 {
            list.push(Name::decode(&mut payload)?);
        }

        Ok(NamePrefixListTlv { list })
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        let payload_len = self.payload_len();
        tlv_encode_hdr(buf, TlvType::NamePrefixList, payload_len);
        for name in &self.list {
            name.encode(buf);
        }
    }

    fn payload_len(&self) -> usize {
        self.list.iter().map(Name::encoded_len).sum()
    }
}

impl Tlv for NamePrefixListTlv {
    fn len(&self) -> usize {
        tlv_len(TlvType::NamePrefixList, self.payload_len())
    }
}

impl<I> From<I> for NamePrefixListTlv
where
    I: IntoIterator<Item = Name>,
{
    fn from(iter: I) -> NamePrefixListTlv {
        NamePrefixListTlv {
            list: iter.into_iter().collect(),
        }
    }
}

// ===== impl Adjacency =====

impl Adjacency {
    pub(crate) fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let mut payload = tlv_expect(buf, TlvType::Adjacency)?;

        let neighbor = Name::decode(&mut payload)?;
        let face_uri = tlv_expect(&mut payload, TlvType::FaceUri)?;
        let face_uri = String::from_utf8(face_uri.to_vec())
            .map_err(|_| DecodeError::InvalidFaceUri)?;
        let cost = nni_decode(&mut payload, TlvType::Cost)?;

        Ok(Adjacency {
            neighbor,
            face_uri,
            cost,
        })
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        let payload_len = self.payload_len();
        tlv_encode_hdr(buf, TlvType::Adjacency, payload_len);
        self.neighbor.encode(buf);
        tlv_encode_hdr(buf, TlvType::FaceUri, self.face_uri.len());
        buf.put_slice(self.face_uri.as_bytes());
        nni_encode(buf, TlvType::Cost, self.cost);
    }

    fn payload_len(&self) -> usize {
        self.neighbor.encoded_len()
            + tlv_len(TlvType::FaceUri, self.face_uri.len())
            + tlv_len(TlvType::Cost, nni_len(self.cost))
    }
}

impl Tlv for Adjacency {
    fn len(&self) -> usize {
        tlv_len(TlvType::Adjacency, self.payload_len())
    }
}

// ===== impl AdjacencyListTlv =====

impl AdjacencyListTlv {
    pub(crate) fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let mut payload = tlv_expect(buf, TlvType::AdjacencyList)?;

        let mut list = vec![];
        while payload.remaining() > 0 {
            list.push(Adjacency::decode(&mut payload)?);
        }

        Ok(AdjacencyListTlv { list })
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        let payload_len = self.payload_len();
        tlv_encode_hdr(buf, TlvType::AdjacencyList, payload_len);
        for adjacency in &self.list {
            adjacency.encode(buf);
        }
    }

    fn payload_len(&self) -> usize {
        self.list.iter().map(Tlv::len).sum()
    }
}

impl Tlv for AdjacencyListTlv {
    fn len(&self) -> usize {
        tlv_len(TlvType::AdjacencyList, self.payload_len())
    }
}
