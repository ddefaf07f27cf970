//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::time::Duration;

use chrono::Utc;
use nlsr_utils::name::Name;
use nlsr_utils::southbound::CommandId;
use nlsr_utils::task::TimeoutTask;
use tokio::sync::mpsc::UnboundedSender;

use crate::collections::LsaEntryId;
use crate::packet::lsa::Lsa;

//
// NLSR tasks diagram:
//                                     +--------------+
//                                     |  transport   |
//                                     +--------------+
//                                           | ^
//                                           | |
//                           lsa_rx (1x) ----+ +---- (1x) fetch_lsa
//                      sync_update (1x) ----+ +---- (1x) sync_publish
//                                           | |
//                                           V |
//                                     +--------------+
//                 adjacency_status -> |              |
//                    prefix_update -> |              |
//            lsa_expiry_timer (Nx) -> |              |
//           lsa_refresh_timer (Nx) -> |   instance   | -> (Nx) fib_command
//          fetch_timeout_timer (Nx) -> |              | <- (Nx) fib_response
//           routing_calc_timer (1x) -> |              |
//              fib_retry_timer (Nx) -> |              |
//                                     +--------------+
//                              ibus_tx (1x) | ^ (1x) ibus_rx
//                                           | |
//                                           V |
//                                     +--------------+
//                                     |     ibus     |
//                                     +--------------+
//

// NLSR inter-task message types.
pub mod messages {
    use bytes::Bytes;
    use nlsr_utils::name::Name;
    use nlsr_utils::southbound::{CommandId, FibCommandMsg};
    use serde::{Deserialize, Serialize};

    use crate::collections::LsaEntryKey;

    // Type aliases.
    pub type ProtocolInputMsg = input::ProtocolMsg;
    pub type ProtocolOutputMsg = output::ProtocolMsg;

    // Input messages (external events and child task -> main task).
    pub mod input {
        use super::*;

        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub enum ProtocolMsg {
            LsaRx(LsaRxMsg),
            SyncUpdate(SyncUpdateMsg),
            SyncRemoval(SyncRemovalMsg),
            AdjacencyStatus(AdjacencyStatusMsg),
            PrefixUpdate(PrefixUpdateMsg),
            LsaExpiry(LsaExpiryMsg),
            LsaRefresh(LsaRefreshMsg),
            FetchTimeout(FetchTimeoutMsg),
            RoutingCalc(RoutingCalcMsg),
            FibResponse(nlsr_utils::southbound::FibResponseMsg),
            FibRetry(FibRetryMsg),
        }

        // LSA data arrived for a previously expressed interest.
        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct LsaRxMsg {
            pub interest_name: Name,
            #[serde(default)]
            pub bytes: Bytes,
        }

        // Sync notification for a remote router.
        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct SyncUpdateMsg {
            pub update_name: Name,
            pub seqno: u64,
        }

        // Sync session teardown notification.
        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct SyncRemovalMsg {
            pub update_name: Name,
        }

        // An adjacency went up or down (liveness detection is external).
        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct AdjacencyStatusMsg {
            pub neighbor: Name,
            pub face_uri: String,
            pub cost: u64,
            pub up: bool,
        }

        // Runtime advertisement or withdrawal of a name prefix.
        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct PrefixUpdateMsg {
            pub name: Name,
            pub multicast: bool,
            pub advertise: bool,
        }

        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct LsaExpiryMsg {
            pub lse_key: LsaEntryKey,
        }

        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct LsaRefreshMsg {
            pub lse_key: LsaEntryKey,
        }

        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct FetchTimeoutMsg {
            pub interest_name: Name,
        }

        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct RoutingCalcMsg {}

        #[derive(Debug)]
        #[derive(Deserialize, Serialize)]
        pub struct FibRetryMsg {
            pub id: CommandId,
        }
    }

    // Output messages (main task -> external collaborators).
    pub mod output {
        use super::*;

        #[derive(Debug)]
        #[derive(Serialize)]
        pub enum ProtocolMsg {
            FetchLsa(FetchLsaMsg),
            SyncPublish(SyncPublishMsg),
            FibCommand(FibCommandMsg),
        }

        // Express an interest for a remote LSA.
        #[derive(Debug)]
        #[derive(Serialize)]
        pub struct FetchLsaMsg {
            pub interest_name: Name,
            pub lifetime: u32,
        }

        // Publish the local combined sequence number.
        #[derive(Debug)]
        #[derive(Serialize)]
        pub struct SyncPublishMsg {
            pub update_name: Name,
            pub seqno: u64,
        }
    }
}

// ===== NLSR tasks =====

// LSA expiration timer.
pub(crate) fn lsa_expiry_timer(
    lse_id: LsaEntryId,
    lsa: &Lsa,
    lsa_expiryp: &UnboundedSender<messages::input::LsaExpiryMsg>,
) -> TimeoutTask {
    #[cfg(not(feature = "testing"))]
    {
        let timeout = (lsa.hdr().expiration_time - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let lsa_expiryp = lsa_expiryp.clone();

        TimeoutTask::new(timeout, move || async move {
            let msg = messages::input::LsaExpiryMsg {
                lse_key: lse_id.into(),
            };
            let _ = lsa_expiryp.send(msg);
        })
    }
    #[cfg(feature = "testing")]
    {
        TimeoutTask {}
    }
}

// Refresh timer for self-originated LSAs.
pub(crate) fn lsa_refresh_timer(
    lse_id: LsaEntryId,
    refresh_time: u32,
    lsa_refreshp: &UnboundedSender<messages::input::LsaRefreshMsg>,
) -> TimeoutTask {
    #[cfg(not(feature = "testing"))]
    {
        let timeout = Duration::from_secs(refresh_time.into());
        let lsa_refreshp = lsa_refreshp.clone();

        TimeoutTask::new(timeout, move || async move {
            let msg = messages::input::LsaRefreshMsg {
                lse_key: lse_id.into(),
            };
            let _ = lsa_refreshp.send(msg);
        })
    }
    #[cfg(feature = "testing")]
    {
        TimeoutTask {}
    }
}

// Deadline for an outstanding LSA fetch.
pub(crate) fn fetch_timeout_timer(
    interest_name: Name,
    timeout: u64,
    fetch_timeoutp: &UnboundedSender<messages::input::FetchTimeoutMsg>,
) -> TimeoutTask {
    #[cfg(not(feature = "testing"))]
    {
        let timeout = Duration::from_millis(timeout);
        let fetch_timeoutp = fetch_timeoutp.clone();

        TimeoutTask::new(timeout, move || async move {
            let msg = messages::input::FetchTimeoutMsg { interest_name };
            let _ = fetch_timeoutp.send(msg);
        })
    }
    #[cfg(feature = "testing")]
    {
        TimeoutTask {}
    }
}

// Coalescing delay between a topology change and the routing
// recalculation.
pub(crate) fn routing_calc_timer(
    interval: u32,
    routing_calcp: &UnboundedSender<messages::input::RoutingCalcMsg>,
) -> TimeoutTask {
    #[cfg(not(feature = "testing"))]
    {
        let timeout = Duration::from_millis(interval.into());
        let routing_calcp = routing_calcp.clone();

        TimeoutTask::new(timeout, move || async move {
            let msg = messages::input::RoutingCalcMsg {};
            let _ = routing_calcp.send(msg);
        })
    }
    #[cfg(feature = "testing")]
    {
        TimeoutTask {}
    }
}

// Backoff before retrying a failed forwarder command.
pub(crate) fn fib_retry_timer(
    id: CommandId,
    timeout: u64,
    fib_retryp: &UnboundedSender<messages::input::FibRetryMsg>,
) -> TimeoutTask {
    #[cfg(not(feature = "testing"))]
    {
        let timeout = Duration::from_millis(timeout);
        let fib_retryp = fib_retryp.clone();

        TimeoutTask::new(timeout, move || async move {
            let msg = messages::input::FibRetryMsg { id };
            let _ = fib_retryp.send(msg);
        })
    }
    #[cfg(feature = "testing")]
    {
        TimeoutTask {}
    }
}
