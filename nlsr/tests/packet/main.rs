//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod lsa;

use bytes::Bytes;
use nlsr::packet::lsa::Lsa;

//
// Helper functions.
//

fn test_encode_lsa(bytes_expected: &[u8], lsa: &Lsa) {
    let bytes_actual = lsa.encode();
    assert_eq!(bytes_expected, bytes_actual.as_ref());
}

fn test_decode_lsa(bytes: &[u8], lsa_expected: &Lsa) {
    let bytes = Bytes::copy_from_slice(bytes);
    let lsa_actual = Lsa::decode(bytes).unwrap();
    assert_eq!(*lsa_expected, lsa_actual);
}

// Round-trip: encode(decode(block)) must be bit-identical.
fn test_round_trip(lsa: &Lsa) {
    let bytes = lsa.encode();
    let decoded = Lsa::decode(bytes.clone()).unwrap();
    assert_eq!(*lsa, decoded);
    assert_eq!(bytes, decoded.encode());
}
