//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::TryGetError;
use nlsr_utils::name::NameDecodeError;
use serde::{Deserialize, Serialize};

use crate::packet::consts::TlvType;

// Type aliases.
pub type DecodeResult<T> = Result<T, DecodeError>;

// LSA decoding errors.
#[derive(Debug)]
#[derive(Deserialize, Serialize)]
pub enum DecodeError {
    ReadOutOfBounds,
    UnexpectedType(u64),
    InvalidLength(u64),
    MissingField(TlvType),
    InvalidFaceUri,
    InvalidExpirationTime(u64),
}

// ===== impl DecodeError =====

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::ReadOutOfBounds => {
                write!(f, "attempt to read out of bounds")
            }
            DecodeError::UnexpectedType(tlv_type) => {
                write!(f, "unexpected TLV type: {tlv_type}")
            }
            DecodeError::InvalidLength(tlv_len) => {
                write!(f, "invalid TLV length: {tlv_len}")
            }
            DecodeError::MissingField(tlv_type) => {
                write!(f, "missing required field: {tlv_type:?}")
            }
            DecodeError::InvalidFaceUri => {
                write!(f, "face URI isn't valid UTF-8")
            }
            DecodeError::InvalidExpirationTime(timestamp) => {
                write!(f, "invalid expiration time: {timestamp}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<TryGetError> for DecodeError {
    fn from(_error: TryGetError) -> DecodeError {
        DecodeError::ReadOutOfBounds
    }
}

impl From<NameDecodeError> for DecodeError {
    fn from(error: NameDecodeError) -> DecodeError {
        match error {
            NameDecodeError::ReadOutOfBounds => DecodeError::ReadOutOfBounds,
            NameDecodeError::UnexpectedType(tlv_type) => {
                DecodeError::UnexpectedType(tlv_type)
            }
            NameDecodeError::InvalidLength(tlv_len) => {
                DecodeError::InvalidLength(tlv_len)
            }
        }
    }
}
