//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod consts;
pub mod error;
pub mod lsa;
pub mod tlv;

use derive_new::new;
use nlsr_utils::name::Name;
use serde::{Deserialize, Serialize};

use crate::packet::consts::LsaType;

// LSA identity within the LSDB.
//
// At most one LSA is stored per (origin router, type) pair; the sequence
// number carries freshness.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct LsaKey {
    pub origin_router: Name,
    pub lsa_type: LsaType,
}
