//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use num_derive::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

// NLSR TLV type numbers.
//
// NDN application types start at 128; values below are from the NLSR
// wire-format assignment.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[derive(FromPrimitive, ToPrimitive)]
#[derive(Deserialize, Serialize)]
pub enum TlvType {
    Lsa = 128,
    NameLsa = 129,
    AdjacencyLsa = 130,
    CoordinateLsa = 131,
    NamePrefixList = 132,
    AdjacencyList = 133,
    Adjacency = 134,
    FaceUri = 135,
    Cost = 136,
    SequenceNumber = 137,
    ExpirationTime = 138,
    HyperbolicRadius = 139,
    HyperbolicAngle = 140,
}

// LSA types.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum LsaType {
    Name,
    Adjacency,
    Coordinate,
}

// ===== impl LsaType =====

impl LsaType {
    pub const ALL: [LsaType; 3] =
        [LsaType::Name, LsaType::Adjacency, LsaType::Coordinate];
}

impl std::fmt::Display for LsaType {
    // The display form doubles as the LSA name component used when fetching
    // and publishing LSAs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LsaType::Name => write!(f, "name"),
            LsaType::Adjacency => write!(f, "adjacency"),
            LsaType::Coordinate => write!(f, "coordinate"),
        }
    }
}
