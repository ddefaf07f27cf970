//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;

use bytes::{Buf, Bytes, BytesMut};
use chrono::{DateTime, TimeZone, Utc};
use derive_new::new;
use enum_as_inner::EnumAsInner;
use nlsr_utils::bytes::{BytesExt, TLS_BUF};
use nlsr_utils::name::Name;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

use crate::packet::LsaKey;
use crate::packet::consts::{LsaType, TlvType};
use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::tlv::{
    Adjacency, AdjacencyListTlv, NamePrefixListTlv, Tlv, double_encode,
    double_decode, nni_decode, nni_encode, nni_len, tlv_encode_hdr,
    tlv_expect, tlv_len,
};

// Link-State Advertisement.
#[derive(Clone, Debug, PartialEq)]
#[derive(EnumAsInner)]
#[derive(Deserialize, Serialize)]
pub enum Lsa {
    Name(NameLsa),
    Adjacency(AdjacencyLsa),
    Coordinate(CoordinateLsa),
}

// Fields common to all LSA types.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct LsaHdr {
    pub origin_router: Name,
    pub seqno: u64,
    pub expiration_time: DateTime<Utc>,
}

// Name prefixes advertised by a router.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct NameLsa {
    pub hdr: LsaHdr,
    pub names: BTreeSet<Name>,
    pub mc_names: BTreeSet<Name>,
}

// Active links of a router.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct AdjacencyLsa {
    pub hdr: LsaHdr,
    pub adjacencies: Vec<Adjacency>,
}

// Hyperbolic coordinates of a router.
#[derive(Clone, Debug, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct CoordinateLsa {
    pub hdr: LsaHdr,
    pub radius: f64,
    pub angles: Vec<f64>,
}

// ===== impl Lsa =====

impl Lsa {
    // Decodes an LSA from a bytes buffer.
    pub fn decode(mut buf: Bytes) -> DecodeResult<Lsa> {
        let tlv_type = buf.try_get_varnum()?;
        let tlv_len = buf.try_get_varnum()?;
        if tlv_len > buf.remaining() as u64 {
            return Err(DecodeError::InvalidLength(tlv_len));
        }
        let mut payload = buf.split_to(tlv_len as usize);

        match TlvType::from_u64(tlv_type) {
            Some(TlvType::NameLsa) => {
                Ok(Lsa::Name(NameLsa::decode(&mut payload)?))
            }
            Some(TlvType::AdjacencyLsa) => {
                Ok(Lsa::Adjacency(AdjacencyLsa::decode(&mut payload)?))
            }
            Some(TlvType::CoordinateLsa) => {
                Ok(Lsa::Coordinate(CoordinateLsa::decode(&mut payload)?))
            }
            _ => Err(DecodeError::UnexpectedType(tlv_type)),
        }
    }

    // Encodes the LSA into a bytes buffer.
    pub fn encode(&self) -> Bytes {
        TLS_BUF.with(|buf| {
            let mut buf = buf.borrow_mut();
            buf.clear();
            match self {
                Lsa::Name(lsa) => lsa.encode(&mut buf),
                Lsa::Adjacency(lsa) => lsa.encode(&mut buf),
                Lsa::Coordinate(lsa) => lsa.encode(&mut buf),
            }
            Bytes::copy_from_slice(&buf)
        })
    }

    pub const fn lsa_type(&self) -> LsaType {
        match self {
            Lsa::Name(_) => LsaType::Name,
            Lsa::Adjacency(_) => LsaType::Adjacency,
            Lsa::Coordinate(_) => LsaType::Coordinate,
        }
    }

    pub const fn hdr(&self) -> &LsaHdr {
        match self {
            Lsa::Name(lsa) => &lsa.hdr,
            Lsa::Adjacency(lsa) => &lsa.hdr,
            Lsa::Coordinate(lsa) => &lsa.hdr,
        }
    }

    pub const fn hdr_mut(&mut self) -> &mut LsaHdr {
        match self {
            Lsa::Name(lsa) => &mut lsa.hdr,
            Lsa::Adjacency(lsa) => &mut lsa.hdr,
            Lsa::Coordinate(lsa) => &mut lsa.hdr,
        }
    }

    pub fn key(&self) -> LsaKey {
        LsaKey::new(self.hdr().origin_router.clone(), self.lsa_type())
    }
}

// ===== impl LsaHdr =====

impl LsaHdr {
    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        if buf.remaining() == 0 {
            return Err(DecodeError::MissingField(TlvType::Lsa));
        }
        let mut payload = tlv_expect(buf, TlvType::Lsa)?;

        let origin_router = Name::decode(&mut payload)?;
        let seqno = nni_decode(&mut payload, TlvType::SequenceNumber)?;
        let timestamp = nni_decode(&mut payload, TlvType::ExpirationTime)?;
        let expiration_time = Utc
            .timestamp_millis_opt(timestamp as i64)
            .single()
            .ok_or(DecodeError::InvalidExpirationTime(timestamp))?;

        Ok(LsaHdr {
            origin_router,
            seqno,
            expiration_time,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        let timestamp = self.expiration_time.timestamp_millis() as u64;
        tlv_encode_hdr(buf, TlvType::Lsa, self.payload_len());
        self.origin_router.encode(buf);
        nni_encode(buf, TlvType::SequenceNumber, self.seqno);
        nni_encode(buf, TlvType::ExpirationTime, timestamp);
    }

    fn payload_len(&self) -> usize {
        let timestamp = self.expiration_time.timestamp_millis() as u64;
        self.origin_router.encoded_len()
            + tlv_len(TlvType::SequenceNumber, nni_len(self.seqno))
            + tlv_len(TlvType::ExpirationTime, nni_len(timestamp))
    }

    fn len(&self) -> usize {
        tlv_len(TlvType::Lsa, self.payload_len())
    }
}

// ===== impl NameLsa =====

impl NameLsa {
    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let hdr = LsaHdr::decode(buf)?;

        // The unicast name prefix list is required, even if empty.
        if buf.remaining() == 0 {
            return Err(DecodeError::MissingField(TlvType::NamePrefixList));
        }
        let names = NamePrefixListTlv::decode(buf)?;

        // Likewise for the multicast name prefix list.
        if buf.remaining() == 0 {
            return Err(DecodeError::MissingField(TlvType::NamePrefixList));
        }
        let mc_names = NamePrefixListTlv::decode(buf)?;

        Ok(NameLsa {
            hdr,
            names: names.list.into_iter().collect(),
            mc_names: mc_names.list.into_iter().collect(),
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        let names = NamePrefixListTlv::from(self.names.iter().cloned());
        let mc_names = NamePrefixListTlv::from(self.mc_names.iter().cloned());
        let payload_len = self.hdr.len() + names.len() + mc_names.len();
        tlv_encode_hdr(buf, TlvType::NameLsa, payload_len);
        self.hdr.encode(buf);
        names.encode(buf);
        mc_names.encode(buf);
    }
}

// ===== impl AdjacencyLsa =====

impl AdjacencyLsa {
    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let hdr = LsaHdr::decode(buf)?;

        if buf.remaining() == 0 {
            return Err(DecodeError::MissingField(TlvType::AdjacencyList));
        }
        let adjacencies = AdjacencyListTlv::decode(buf)?;

        Ok(AdjacencyLsa {
            hdr,
            adjacencies: adjacencies.list,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        let adjacencies = AdjacencyListTlv::new(self.adjacencies.clone());
        let payload_len = self.hdr.len() + adjacencies.len();
        tlv_encode_hdr(buf, TlvType::AdjacencyLsa, payload_len);
        self.hdr.encode(buf);
        adjacencies.encode(buf);
    }

    // Returns the advertised link to the given neighbor, if any.
    pub fn adjacency(&self, neighbor: &Name) -> Option<&Adjacency> {
        self.adjacencies
            .iter()
            .find(|adjacency| &adjacency.neighbor == neighbor)
    }
}

// ===== impl CoordinateLsa =====

impl CoordinateLsa {
    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let hdr = LsaHdr::decode(buf)?;

        if buf.remaining() == 0 {
            return Err(DecodeError::MissingField(TlvType::HyperbolicRadius));
        }
        let radius = double_decode(buf, TlvType::HyperbolicRadius)?;

        let mut angles = vec![];
        while buf.remaining() > 0 {
            angles.push(double_decode(buf, TlvType::HyperbolicAngle)?);
        }

        Ok(CoordinateLsa { hdr, radius, angles })
    }

    fn encode(&self, buf: &mut BytesMut) {
        let payload_len = self.hdr.len()
            + tlv_len(TlvType::HyperbolicRadius, 8)
            + self.angles.len() * tlv_len(TlvType::HyperbolicAngle, 8);
        tlv_encode_hdr(buf, TlvType::CoordinateLsa, payload_len);
        self.hdr.encode(buf);
        double_encode(buf, TlvType::HyperbolicRadius, self.radius);
        for angle in &self.angles {
            double_encode(buf, TlvType::HyperbolicAngle, *angle);
        }
    }
}
