//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet, HashMap};

use nlsr_utils::name::Name;
use nlsr_utils::southbound::FibResponseMsg;
use nlsr_utils::task::TimeoutTask;
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::collections::{Arena, Lsdb};
use crate::config::InstanceCfg;
use crate::debug::Debug;
use crate::error::Error;
use crate::fib::Fib;
use crate::ibus::{IbusMsg, IbusReceiver, IbusSender};
use crate::lsdb::LsaEntry;
use crate::npt::NamePrefixTable;
use crate::route::RoutingTable;
use crate::seqnum::SequencingManager;
use crate::tasks;
use crate::tasks::messages::input::{
    AdjacencyStatusMsg, FetchTimeoutMsg, FibRetryMsg, LsaExpiryMsg,
    LsaRefreshMsg, LsaRxMsg, PrefixUpdateMsg, RoutingCalcMsg, SyncRemovalMsg,
    SyncUpdateMsg,
};
use crate::tasks::messages::{ProtocolInputMsg, ProtocolOutputMsg};
use crate::{events, lsdb};

#[derive(Debug)]
pub struct Instance {
    // Instance name.
    pub name: String,
    // Instance configuration data.
    pub config: InstanceCfg,
    // Instance state data.
    pub state: InstanceState,
    // Instance arenas.
    pub arenas: InstanceArenas,
    // Instance Tx channels.
    pub tx: InstanceChannelsTx,
}

#[derive(Debug)]
pub struct InstanceState {
    // Link State Database.
    pub lsdb: Lsdb,
    // Sequence numbers of the self-originated LSAs.
    pub seqmgr: SequencingManager,
    // Local adjacency list, fed by the external liveness detector.
    pub neighbors: BTreeMap<Name, Neighbor>,
    // Name prefixes currently advertised by the local router.
    pub advertised_names: BTreeSet<Name>,
    pub advertised_mc_names: BTreeSet<Name>,
    // Unicast routing table.
    pub routing_table: RoutingTable,
    // Name Prefix Table.
    pub npt: NamePrefixTable,
    // FIB projector.
    pub fib: Fib,
    // Outstanding LSA fetches.
    pub pending_fetches: HashMap<Name, PendingFetch>,
    // Pending coalesced routing recalculation.
    pub routing_calc_timer: Option<TimeoutTask>,
    // Event counters.
    pub counters: InstanceCounters,
}

// Local adjacency as reported by the external liveness detector.
#[derive(Debug)]
pub struct Neighbor {
    pub name: Name,
    pub face_uri: String,
    pub cost: u64,
    pub up: bool,
}

// Outstanding LSA fetch and its deadline.
#[derive(Debug)]
pub struct PendingFetch {
    pub attempts: u8,
    pub deadline_timer: Option<TimeoutTask>,
}

#[derive(Debug, Default)]
pub struct InstanceCounters {
    pub lsa_installs: u32,
    pub lsa_expirations: u32,
    pub routing_calc_runs: u32,
    pub fib_command_failures: u32,
}

#[derive(Debug, Default)]
pub struct InstanceArenas {
    pub lsa_entries: Arena<LsaEntry>,
}

#[derive(Clone, Debug)]
pub struct ProtocolInputChannelsTx {
    // LSA data receipt.
    pub lsa_rx: UnboundedSender<LsaRxMsg>,
    // Sync notifications.
    pub sync_update: UnboundedSender<SyncUpdateMsg>,
    pub sync_removal: UnboundedSender<SyncRemovalMsg>,
    // Adjacency liveness events.
    pub adjacency_status: UnboundedSender<AdjacencyStatusMsg>,
    // Runtime prefix advertisement events.
    pub prefix_update: UnboundedSender<PrefixUpdateMsg>,
    // LSA expiration event.
    pub lsa_expiry: UnboundedSender<LsaExpiryMsg>,
    // LSA refresh event.
    pub lsa_refresh: UnboundedSender<LsaRefreshMsg>,
    // LSA fetch deadline event.
    pub fetch_timeout: UnboundedSender<FetchTimeoutMsg>,
    // Routing calculation event.
    pub routing_calc: UnboundedSender<RoutingCalcMsg>,
    // Forwarder acknowledgments.
    pub fib_response: UnboundedSender<FibResponseMsg>,
    // Forwarder command retry event.
    pub fib_retry: UnboundedSender<FibRetryMsg>,
}

#[derive(Debug)]
pub struct ProtocolInputChannelsRx {
    pub lsa_rx: UnboundedReceiver<LsaRxMsg>,
    pub sync_update: UnboundedReceiver<SyncUpdateMsg>,
    pub sync_removal: UnboundedReceiver<SyncRemovalMsg>,
    pub adjacency_status: UnboundedReceiver<AdjacencyStatusMsg>,
    pub prefix_update: UnboundedReceiver<PrefixUpdateMsg>,
    pub lsa_expiry: UnboundedReceiver<LsaExpiryMsg>,
    pub lsa_refresh: UnboundedReceiver<LsaRefreshMsg>,
    pub fetch_timeout: UnboundedReceiver<FetchTimeoutMsg>,
    pub routing_calc: UnboundedReceiver<RoutingCalcMsg>,
    pub fib_response: UnboundedReceiver<FibResponseMsg>,
    pub fib_retry: UnboundedReceiver<FibRetryMsg>,
}

#[derive(Clone, Debug)]
pub struct InstanceChannelsTx {
    pub ibus: IbusSender,
    pub protocol_input: ProtocolInputChannelsTx,
    pub protocol_output: UnboundedSender<ProtocolOutputMsg>,
}

#[derive(Debug)]
pub struct InstanceChannelsRx {
    pub ibus: IbusReceiver,
    pub protocol_input: ProtocolInputChannelsRx,
}

pub struct InstanceUpView<'a> {
    pub name: &'a str,
    pub config: &'a InstanceCfg,
    pub state: &'a mut InstanceState,
    pub tx: &'a InstanceChannelsTx,
}

// ===== impl Instance =====

impl Instance {
    // Creates the instance together with its inbound channel set and the
    // outbound channel consumed by the external transport and forwarder.
    pub fn new(
        name: String,
        config: InstanceCfg,
    ) -> (Instance, InstanceChannelsRx, UnboundedReceiver<ProtocolOutputMsg>)
    {
        Debug::InstanceCreate.log();

        let (ibus_tx, ibus_rx) = mpsc::unbounded_channel();
        let (proto_output_tx, proto_output_rx) = mpsc::unbounded_channel();
        let (proto_input_tx, proto_input_rx) = Self::protocol_input_channels();
        let tx = InstanceChannelsTx {
            ibus: ibus_tx,
            protocol_input: proto_input_tx,
            protocol_output: proto_output_tx,
        };

        let state = InstanceState::new(&config, &tx);
        let instance = Instance {
            name,
            config,
            state,
            arenas: Default::default(),
            tx,
        };
        let rx = InstanceChannelsRx {
            ibus: ibus_rx,
            protocol_input: proto_input_rx,
        };
        (instance, rx, proto_output_rx)
    }

    // Loads persisted state and originates the initial LSAs.
    //
    // A sequence file error at this point is fatal: without it the router
    // could republish stale sequence numbers.
    pub fn start(&mut self) -> Result<(), Error> {
        Debug::InstanceStart.log();

        let (mut instance, arenas) = self.as_up();
        instance.state.seqmgr.load()?;
        lsdb::originate_all(&mut instance, &mut arenas.lsa_entries);
        Ok(())
    }

    // Main event loop.
    pub async fn run(mut self, mut rx: InstanceChannelsRx) {
        loop {
            tokio::select! {
                // Internal bus events drain before protocol events so that
                // new destinations exist in the routing pool by the time a
                // routing change tries to cite them.
                biased;
                msg = rx.ibus.recv() => {
                    let Some(msg) = msg else { break };
                    self.process_ibus_msg(msg);
                }
                msg = rx.protocol_input.recv() => {
                    let Some(msg) = msg else { break };
                    self.process_protocol_msg(msg);
                }
            }
        }
        self.shutdown();
    }

    pub fn process_ibus_msg(&mut self, msg: IbusMsg) {
        let (mut instance, arenas) = self.as_up();
        events::process_ibus_msg(&mut instance, arenas, msg);
    }

    pub fn process_protocol_msg(&mut self, msg: ProtocolInputMsg) {
        let (mut instance, arenas) = self.as_up();
        if let Err(error) = events::process_protocol_msg(&mut instance, arenas, msg)
        {
            error.log();
        }
    }

    // Dropping the instance cancels every outstanding timer and drops the
    // pending forwarder commands.
    fn shutdown(self) {
        Debug::InstanceShutdown.log();
    }

    // Returns a view struct for the instance.
    pub fn as_up(&mut self) -> (InstanceUpView<'_>, &mut InstanceArenas) {
        let instance = InstanceUpView {
            name: &self.name,
            config: &self.config,
            state: &mut self.state,
            tx: &self.tx,
        };
        (instance, &mut self.arenas)
    }

    fn protocol_input_channels()
    -> (ProtocolInputChannelsTx, ProtocolInputChannelsRx) {
        let (lsa_rxp, lsa_rxc) = mpsc::unbounded_channel();
        let (sync_updatep, sync_updatec) = mpsc::unbounded_channel();
        let (sync_removalp, sync_removalc) = mpsc::unbounded_channel();
        let (adjacency_statusp, adjacency_statusc) = mpsc::unbounded_channel();
        let (prefix_updatep, prefix_updatec) = mpsc::unbounded_channel();
        let (lsa_expiryp, lsa_expiryc) = mpsc::unbounded_channel();
        let (lsa_refreshp, lsa_refreshc) = mpsc::unbounded_channel();
        let (fetch_timeoutp, fetch_timeoutc) = mpsc::unbounded_channel();
        let (routing_calcp, routing_calcc) = mpsc::unbounded_channel();
        let (fib_responsep, fib_responsec) = mpsc::unbounded_channel();
        let (fib_retryp, fib_retryc) = mpsc::unbounded_channel();

        let tx = ProtocolInputChannelsTx {
            lsa_rx: lsa_rxp,
            sync_update: sync_updatep,
            sync_removal: sync_removalp,
            adjacency_status: adjacency_statusp,
            prefix_update: prefix_updatep,
            lsa_expiry: lsa_expiryp,
            lsa_refresh: lsa_refreshp,
            fetch_timeout: fetch_timeoutp,
            routing_calc: routing_calcp,
            fib_response: fib_responsep,
            fib_retry: fib_retryp,
        };
        let rx = ProtocolInputChannelsRx {
            lsa_rx: lsa_rxc,
            sync_update: sync_updatec,
            sync_removal: sync_removalc,
            adjacency_status: adjacency_statusc,
            prefix_update: prefix_updatec,
            lsa_expiry: lsa_expiryc,
            lsa_refresh: lsa_refreshc,
            fetch_timeout: fetch_timeoutc,
            routing_calc: routing_calcc,
            fib_response: fib_responsec,
            fib_retry: fib_retryc,
        };

        (tx, rx)
    }
}

// ===== impl InstanceState =====

impl InstanceState {
    fn new(config: &InstanceCfg, tx: &InstanceChannelsTx) -> InstanceState {
        InstanceState {
            lsdb: Default::default(),
            seqmgr: SequencingManager::new(&config.state_dir),
            neighbors: Default::default(),
            advertised_names: config.advertised_names.clone(),
            advertised_mc_names: config.advertised_mc_names.clone(),
            routing_table: Default::default(),
            npt: Default::default(),
            fib: Fib::new(
                tx.protocol_output.clone(),
                tx.protocol_input.fib_retry.clone(),
                tx.ibus.clone(),
            ),
            pending_fetches: Default::default(),
            routing_calc_timer: None,
            counters: Default::default(),
        }
    }
}

// ===== impl ProtocolInputChannelsRx =====

impl ProtocolInputChannelsRx {
    async fn recv(&mut self) -> Option<ProtocolInputMsg> {
        tokio::select! {
            msg = self.lsa_rx.recv() => {
                msg.map(ProtocolInputMsg::LsaRx)
            }
            msg = self.sync_update.recv() => {
                msg.map(ProtocolInputMsg::SyncUpdate)
            }
            msg = self.sync_removal.recv() => {
                msg.map(ProtocolInputMsg::SyncRemoval)
            }
            msg = self.adjacency_status.recv() => {
                msg.map(ProtocolInputMsg::AdjacencyStatus)
            }
            msg = self.prefix_update.recv() => {
                msg.map(ProtocolInputMsg::PrefixUpdate)
            }
            msg = self.lsa_expiry.recv() => {
                msg.map(ProtocolInputMsg::LsaExpiry)
            }
            msg = self.lsa_refresh.recv() => {
                msg.map(ProtocolInputMsg::LsaRefresh)
            }
            msg = self.fetch_timeout.recv() => {
                msg.map(ProtocolInputMsg::FetchTimeout)
            }
            msg = self.routing_calc.recv() => {
                msg.map(ProtocolInputMsg::RoutingCalc)
            }
            msg = self.fib_response.recv() => {
                msg.map(ProtocolInputMsg::FibResponse)
            }
            msg = self.fib_retry.recv() => {
                msg.map(ProtocolInputMsg::FibRetry)
            }
        }
    }
}

// ===== impl InstanceUpView =====

impl InstanceUpView<'_> {
    // Schedules a coalesced routing table recalculation.
    pub(crate) fn schedule_routing_calc(&mut self) {
        if self.state.routing_calc_timer.is_none() {
            let task = tasks::routing_calc_timer(
                self.config.routing_calc_interval,
                &self.tx.protocol_input.routing_calc,
            );
            self.state.routing_calc_timer = Some(task);
        }
    }
}
