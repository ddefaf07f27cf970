//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::name::Name;

// Command identifier allocated by the FIB projector.
pub type CommandId = u64;

// ===== Forwarder messages =====

/// Single operation on the forwarder's name-to-face table.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum FibOp {
    /// Register a next hop for a name prefix.
    RegisterNexthop {
        name: Name,
        face_uri: String,
        cost: u64,
    },
    /// Unregister a next hop for a name prefix.
    UnregisterNexthop { name: Name, face_uri: String },
}

/// Command sent to the external forwarder daemon.
#[derive(Clone, Debug, new)]
#[derive(Deserialize, Serialize)]
pub struct FibCommandMsg {
    pub id: CommandId,
    pub op: FibOp,
}

/// Forwarder acknowledgment for a previously issued command.
#[derive(Clone, Copy, Debug, new)]
#[derive(Deserialize, Serialize)]
pub struct FibResponseMsg {
    pub id: CommandId,
    pub success: bool,
}

// ===== impl FibOp =====

impl FibOp {
    /// Returns the name prefix the operation applies to.
    pub fn name(&self) -> &Name {
        match self {
            FibOp::RegisterNexthop { name, .. }
            | FibOp::UnregisterNexthop { name, .. } => name,
        }
    }

    /// Returns the face the operation applies to.
    pub fn face_uri(&self) -> &str {
        match self {
            FibOp::RegisterNexthop { face_uri, .. }
            | FibOp::UnregisterNexthop { face_uri, .. } => face_uri,
        }
    }
}
