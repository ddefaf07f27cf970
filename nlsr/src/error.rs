//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use nlsr_utils::name::Name;
use nlsr_utils::southbound::FibOp;
use tracing::{error, warn};

use crate::collections::LsaEntryId;
use crate::packet::LsaKey;
use crate::packet::error::DecodeError;

// NLSR errors.
#[derive(Debug)]
pub enum Error {
    // Inter-task communication
    LsaEntryIdNotFound(LsaEntryId),
    LsaEntryNotFound(LsaKey),
    // LSA input
    LsaDecodeError(Name, DecodeError),
    LsaFetchExhausted(Name),
    // Routing
    TopologyInconsistent(Name, Name),
    // Southbound
    ForwarderUnavailable(FibOp),
    // Sequence number file
    SequenceFileIO(std::io::Error),
}

// ===== impl Error =====

impl Error {
    pub(crate) fn log(&self) {
        match self {
            Error::LsaEntryIdNotFound(lse_id) => {
                warn!(?lse_id, "{}", self);
            }
            Error::LsaEntryNotFound(lsa_key) => {
                warn!(?lsa_key, "{}", self);
            }
            Error::LsaDecodeError(interest_name, error) => {
                warn!(%interest_name, %error, "{}", self);
            }
            Error::LsaFetchExhausted(interest_name) => {
                warn!(%interest_name, "{}", self);
            }
            Error::TopologyInconsistent(router_a, router_b) => {
                warn!(%router_a, %router_b, "{}", self);
            }
            Error::ForwarderUnavailable(op) => {
                warn!(name = %op.name(), face_uri = %op.face_uri(), "{}", self);
            }
            Error::SequenceFileIO(error) => {
                error!(%error, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::LsaEntryIdNotFound(..) => {
                write!(f, "LSA entry ID not found")
            }
            Error::LsaEntryNotFound(..) => {
                write!(f, "LSA entry not found")
            }
            Error::LsaDecodeError(..) => {
                write!(f, "failed to decode LSA")
            }
            Error::LsaFetchExhausted(..) => {
                write!(f, "giving up on LSA fetch after too many timeouts")
            }
            Error::TopologyInconsistent(..) => {
                write!(f, "adjacency costs don't match, dropping link")
            }
            Error::ForwarderUnavailable(..) => {
                write!(f, "forwarder command failed after all retries")
            }
            Error::SequenceFileIO(..) => {
                write!(f, "failed to update the sequence number file")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::LsaDecodeError(_, error) => Some(error),
            Error::SequenceFileIO(error) => Some(error),
            _ => None,
        }
    }
}
