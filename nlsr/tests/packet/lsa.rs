//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::LazyLock as Lazy;

use bytes::Bytes;
use chrono::{TimeZone, Utc};
use maplit::btreeset;
use nlsr::packet::consts::TlvType;
use nlsr::packet::error::DecodeError;
use nlsr::packet::lsa::{
    AdjacencyLsa, CoordinateLsa, Lsa, LsaHdr, NameLsa,
};
use nlsr::packet::tlv::Adjacency;
use nlsr_utils::name::Name;

use super::{test_decode_lsa, test_encode_lsa, test_round_trip};

fn name(uri: &str) -> Name {
    Name::from_uri(uri).unwrap()
}

//
// Test packets.
//

static NAME_LSA1: Lazy<(Vec<u8>, Lsa)> = Lazy::new(|| {
    (
        vec![
            0x81, 0x1a, 0x80, 0x0e, 0x07, 0x03, 0x08, 0x01, 0x61, 0x89, 0x01,
            0x01, 0x8a, 0x04, 0x00, 0x0f, 0x42, 0x40, 0x84, 0x06, 0x07, 0x04,
            0x08, 0x02, 0x6e, 0x31, 0x84, 0x00,
        ],
        Lsa::Name(NameLsa::new(
            LsaHdr::new(
                name("/a"),
                1,
                Utc.timestamp_millis_opt(1_000_000).unwrap(),
            ),
            btreeset![name("/n1")],
            btreeset![],
        )),
    )
});

#[test]
fn test_encode_name_lsa1() {
    let (ref bytes, ref lsa) = *NAME_LSA1;
    test_encode_lsa(bytes, lsa);
}

#[test]
fn test_decode_name_lsa1() {
    let (ref bytes, ref lsa) = *NAME_LSA1;
    test_decode_lsa(bytes, lsa);
}

#[test]
fn test_round_trip_name_lsa() {
    let lsa = Lsa::Name(NameLsa::new(
        LsaHdr::new(
            name("/ndn/cn/edu/bupt/%C1.Router/bupt"),
            12,
            Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        ),
        btreeset![name("/ndn/cn/edu/bupt"), name("/cn/bupt/mail")],
        btreeset![name("/video")],
    ));
    test_round_trip(&lsa);
}

#[test]
fn test_round_trip_adjacency_lsa() {
    let lsa = Lsa::Adjacency(AdjacencyLsa::new(
        LsaHdr::new(
            name("/ndn/site/%C1.Router/this-router"),
            7,
            Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        ),
        vec![
            Adjacency::new(
                name("/ndn/site/%C1.Router/b"),
                "udp4://10.0.0.2".to_owned(),
                5,
            ),
            Adjacency::new(
                name("/ndn/site/%C1.Router/c"),
                "udp4://10.0.0.3".to_owned(),
                10,
            ),
        ],
    ));
    test_round_trip(&lsa);
}

#[test]
fn test_round_trip_coordinate_lsa() {
    let lsa = Lsa::Coordinate(CoordinateLsa::new(
        LsaHdr::new(
            name("/ndn/site/%C1.Router/b"),
            3,
            Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        ),
        12.34,
        vec![1.047, 2.094],
    ));
    test_round_trip(&lsa);
}

//
// Decode error cases.
//

#[test]
fn test_decode_missing_name_prefix_list() {
    // NameLSA whose body ends right after the base LSA TLV.
    let bytes = vec![
        0x81, 0x10, 0x80, 0x0e, 0x07, 0x03, 0x08, 0x01, 0x61, 0x89, 0x01,
        0x01, 0x8a, 0x04, 0x00, 0x0f, 0x42, 0x40,
    ];
    let error = Lsa::decode(Bytes::from(bytes)).unwrap_err();
    assert!(matches!(
        error,
        DecodeError::MissingField(TlvType::NamePrefixList)
    ));
}

#[test]
fn test_decode_missing_multicast_name_prefix_list() {
    // NameLSA carrying a single name prefix list.
    let bytes = vec![
        0x81, 0x12, 0x80, 0x0e, 0x07, 0x03, 0x08, 0x01, 0x61, 0x89, 0x01,
        0x01, 0x8a, 0x04, 0x00, 0x0f, 0x42, 0x40, 0x84, 0x00,
    ];
    let error = Lsa::decode(Bytes::from(bytes)).unwrap_err();
    assert!(matches!(
        error,
        DecodeError::MissingField(TlvType::NamePrefixList)
    ));
}

#[test]
fn test_decode_unexpected_ordering() {
    // An AdjacencyList TLV where the name prefix lists belong.
    let bytes = vec![
        0x81, 0x12, 0x80, 0x0e, 0x07, 0x03, 0x08, 0x01, 0x61, 0x89, 0x01,
        0x01, 0x8a, 0x04, 0x00, 0x0f, 0x42, 0x40, 0x85, 0x00,
    ];
    let error = Lsa::decode(Bytes::from(bytes)).unwrap_err();
    assert!(matches!(error, DecodeError::UnexpectedType(133)));
}

#[test]
fn test_decode_unknown_lsa_type() {
    let bytes = vec![0x70, 0x00];
    let error = Lsa::decode(Bytes::from(bytes)).unwrap_err();
    assert!(matches!(error, DecodeError::UnexpectedType(0x70)));
}

#[test]
fn test_decode_truncated() {
    let (ref bytes, _) = *NAME_LSA1;
    let truncated = Bytes::copy_from_slice(&bytes[..bytes.len() - 4]);
    assert!(Lsa::decode(truncated).is_err());
}
