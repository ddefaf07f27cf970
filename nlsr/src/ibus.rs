//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;

use nlsr_utils::name::Name;
use nlsr_utils::southbound::FibOp;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::lsdb::LsdbUpdate;
use crate::packet::lsa::Lsa;
use crate::route::RoutingTableEntry;

// Useful type definitions.
pub type IbusReceiver = UnboundedReceiver<IbusMsg>;
pub type IbusSender = UnboundedSender<IbusMsg>;

// Typed events exchanged between the routing core components.
//
// The Name Prefix Table subscribes to the bus once at instance creation;
// the LSDB and the routing table publish to it and never call into their
// consumers directly.
#[derive(Clone, Debug)]
#[derive(Deserialize, Serialize)]
pub enum IbusMsg {
    /// LSDB content change notification.
    ///
    /// For NameLSA updates, the four sets carry the prefix diff between the
    /// previous and the new advertisement. They are empty for the other LSA
    /// types and for installs and removals, where consumers read the LSA
    /// payload directly.
    LsdbEvent {
        lsa: Lsa,
        kind: LsdbUpdate,
        add_names: BTreeSet<Name>,
        remove_names: BTreeSet<Name>,
        add_mc_names: BTreeSet<Name>,
        remove_mc_names: BTreeSet<Name>,
    },
    /// Routing table recomputation notification, carrying the full new
    /// set of unicast routing entries.
    RoutingChanged { entries: Vec<RoutingTableEntry> },
    /// A forwarder command was dropped after exhausting all retries.
    FibCommandFailed { op: FibOp },
}
