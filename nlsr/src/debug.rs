//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use nlsr_utils::name::Name;
use nlsr_utils::southbound::CommandId;
use tracing::{debug, debug_span};

use crate::packet::LsaKey;
use crate::packet::lsa::Lsa;

// NLSR debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    // Instances
    InstanceCreate,
    InstanceStart,
    InstanceShutdown,
    // Adjacencies
    AdjacencyChange(&'a Name, bool),
    // LSDB maintenance
    LsaInstall(&'a Lsa),
    LsaOriginate(&'a Lsa),
    LsaRefresh(&'a LsaKey),
    LsaExpire(&'a LsaKey),
    LsaStale(&'a LsaKey),
    // Sync
    LsaFetch(&'a Name),
    LsaFetchRetry(&'a Name, u8),
    SyncRx(&'a Name, u64),
    SyncPublish(&'a Name, u64),
    SyncRemoval(&'a Name),
    // Routing
    RoutingCalcStart,
    RoutingCalcFinish(usize),
    // Name Prefix Table
    NptAddEntry(&'a Name, &'a Name),
    NptRemoveEntry(&'a Name, &'a Name),
    NptMcJoin(&'a Name, &'a Name),
    NptMcLeave(&'a Name, &'a Name),
    // FIB
    FibUpdate(&'a Name, usize),
    FibRemove(&'a Name),
    FibRetry(CommandId, u8),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::InstanceCreate
            | Debug::InstanceStart
            | Debug::InstanceShutdown => {
                debug!("{}", self);
            }
            Debug::AdjacencyChange(neighbor, up) => {
                debug!(%neighbor, %up, "{}", self);
            }
            Debug::LsaInstall(lsa) | Debug::LsaOriginate(lsa) => {
                let hdr = lsa.hdr();
                debug!(origin = %hdr.origin_router, lsa_type = %lsa.lsa_type(),
                    seqno = %hdr.seqno, "{}", self);
            }
            Debug::LsaRefresh(lsa_key)
            | Debug::LsaExpire(lsa_key)
            | Debug::LsaStale(lsa_key) => {
                debug!(origin = %lsa_key.origin_router,
                    lsa_type = %lsa_key.lsa_type, "{}", self);
            }
            Debug::LsaFetch(interest_name) => {
                debug!(%interest_name, "{}", self);
            }
            Debug::LsaFetchRetry(interest_name, attempts) => {
                debug!(%interest_name, %attempts, "{}", self);
            }
            Debug::SyncRx(update_name, seqno)
            | Debug::SyncPublish(update_name, seqno) => {
                debug_span!("sync").in_scope(|| {
                    debug!(%update_name, %seqno, "{}", self);
                });
            }
            Debug::SyncRemoval(update_name) => {
                debug_span!("sync").in_scope(|| {
                    debug!(%update_name, "{}", self);
                });
            }
            Debug::RoutingCalcStart => {
                debug!("{}", self);
            }
            Debug::RoutingCalcFinish(destinations) => {
                debug!(%destinations, "{}", self);
            }
            Debug::NptAddEntry(prefix, origin)
            | Debug::NptRemoveEntry(prefix, origin) => {
                debug!(%prefix, %origin, "{}", self);
            }
            Debug::NptMcJoin(group, member) | Debug::NptMcLeave(group, member) => {
                debug!(%group, %member, "{}", self);
            }
            Debug::FibUpdate(name, nexthops) => {
                debug!(%name, %nexthops, "{}", self);
            }
            Debug::FibRemove(name) => {
                debug!(%name, "{}", self);
            }
            Debug::FibRetry(command_id, attempts) => {
                debug!(%command_id, %attempts, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::InstanceCreate => {
                write!(f, "instance created")
            }
            Debug::InstanceStart => {
                write!(f, "starting instance")
            }
            Debug::InstanceShutdown => {
                write!(f, "shutting down instance")
            }
            Debug::AdjacencyChange(..) => {
                write!(f, "adjacency status change")
            }
            Debug::LsaInstall(..) => {
                write!(f, "installing LSA")
            }
            Debug::LsaOriginate(..) => {
                write!(f, "originating LSA")
            }
            Debug::LsaRefresh(..) => {
                write!(f, "refreshing LSA")
            }
            Debug::LsaExpire(..) => {
                write!(f, "LSA expired")
            }
            Debug::LsaStale(..) => {
                write!(f, "discarding stale LSA")
            }
            Debug::LsaFetch(..) => {
                write!(f, "fetching LSA")
            }
            Debug::LsaFetchRetry(..) => {
                write!(f, "retrying LSA fetch")
            }
            Debug::SyncRx(..) => {
                write!(f, "received sync update")
            }
            Debug::SyncPublish(..) => {
                write!(f, "publishing sync update")
            }
            Debug::SyncRemoval(..) => {
                write!(f, "received sync removal")
            }
            Debug::RoutingCalcStart => {
                write!(f, "starting routing table calculation")
            }
            Debug::RoutingCalcFinish(..) => {
                write!(f, "routing table calculation done")
            }
            Debug::NptAddEntry(..) => {
                write!(f, "adding origin to name prefix")
            }
            Debug::NptRemoveEntry(..) => {
                write!(f, "removing origin from name prefix")
            }
            Debug::NptMcJoin(..) => {
                write!(f, "router joining multicast group")
            }
            Debug::NptMcLeave(..) => {
                write!(f, "router leaving multicast group")
            }
            Debug::FibUpdate(..) => {
                write!(f, "updating FIB entry")
            }
            Debug::FibRemove(..) => {
                write!(f, "removing FIB entry")
            }
            Debug::FibRetry(..) => {
                write!(f, "retrying forwarder command")
            }
        }
    }
}
