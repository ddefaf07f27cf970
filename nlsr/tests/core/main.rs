//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(dead_code)]

mod fib;
mod lsdb;
mod route;

use chrono::{DateTime, TimeDelta, Utc};
use nlsr::config::InstanceCfg;
use nlsr::instance::{Instance, InstanceChannelsRx};
use nlsr::lsdb::InstallOutcome;
use nlsr::packet::LsaKey;
use nlsr::packet::lsa::{
    AdjacencyLsa, CoordinateLsa, Lsa, LsaHdr, NameLsa,
};
use nlsr::packet::tlv::Adjacency;
use nlsr::route::{Nexthop, NexthopList, RoutingTableEntry};
use nlsr::ibus::IbusMsg;
use nlsr::tasks::messages::ProtocolOutputMsg;
use nlsr::tasks::messages::input::{ProtocolMsg, RoutingCalcMsg};
use nlsr_utils::name::Name;
use tokio::sync::mpsc::UnboundedReceiver;

//
// Test fixture.
//

pub struct TestRouter {
    pub instance: Instance,
    pub rx: InstanceChannelsRx,
    pub output_rx: UnboundedReceiver<ProtocolOutputMsg>,
}

pub fn name(uri: &str) -> Name {
    Name::from_uri(uri).unwrap()
}

// Per-test scratch directory for the sequence number file.
pub fn temp_state_dir(tag: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir()
        .join(format!("nlsr-test-{}-{}", std::process::id(), tag));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn new_router(router_name: &str) -> TestRouter {
    new_router_with_config(router_name, InstanceCfg::default())
}

pub fn new_router_with_config(
    router_name: &str,
    mut config: InstanceCfg,
) -> TestRouter {
    config.router_name = name(router_name);
    let (instance, rx, output_rx) = Instance::new("test".to_owned(), config);
    TestRouter {
        instance,
        rx,
        output_rx,
    }
}

impl TestRouter {
    // Processes every queued internal bus event.
    pub fn drain_ibus(&mut self) {
        while let Ok(msg) = self.rx.ibus.try_recv() {
            self.instance.process_ibus_msg(msg);
        }
    }

    // Installs an LSA as if it had been fetched from the network.
    pub fn install(&mut self, lsa: Lsa) -> InstallOutcome {
        let (mut instance, arenas) = self.instance.as_up();
        nlsr::lsdb::install(&mut instance, &mut arenas.lsa_entries, lsa)
    }

    // Removes an LSA as if it had expired.
    pub fn remove(&mut self, key: &LsaKey) -> bool {
        let (mut instance, arenas) = self.instance.as_up();
        nlsr::lsdb::remove(&mut instance, &mut arenas.lsa_entries, key)
    }

    // Runs the routing table calculation and applies its outcome.
    pub fn run_routing_calc(&mut self) {
        self.instance
            .process_protocol_msg(ProtocolMsg::RoutingCalc(RoutingCalcMsg {}));
        self.drain_ibus();
    }

    // Injects a routing change notification.
    pub fn routing_change(&mut self, entries: Vec<RoutingTableEntry>) {
        self.instance
            .process_ibus_msg(IbusMsg::RoutingChanged { entries });
    }

    // Collects the messages queued toward the external collaborators.
    pub fn drain_output(&mut self) -> Vec<ProtocolOutputMsg> {
        let mut msgs = vec![];
        while let Ok(msg) = self.output_rx.try_recv() {
            msgs.push(msg);
        }
        msgs
    }

    // Checks that the FIB mirrors the NPT: entries with next hops are
    // projected with the same faces, entries without next hops aren't
    // present.
    pub fn check_fib_consistency(&self) {
        let state = &self.instance.state;
        for entry in state.npt.entries.values() {
            if entry.nexthops.is_empty() {
                assert!(!state.fib.entries.contains_key(&entry.prefix));
            } else {
                assert_eq!(
                    state.fib.entries[&entry.prefix].nexthops,
                    entry.nexthops
                );
            }
        }
    }
}

//
// LSA builders.
//

pub fn expiration() -> DateTime<Utc> {
    Utc::now() + TimeDelta::hours(1)
}

pub fn name_lsa(
    origin: &str,
    seqno: u64,
    names: &[&str],
    mc_names: &[&str],
) -> Lsa {
    Lsa::Name(NameLsa::new(
        LsaHdr::new(name(origin), seqno, expiration()),
        names.iter().map(|uri| name(uri)).collect(),
        mc_names.iter().map(|uri| name(uri)).collect(),
    ))
}

pub fn adj_lsa(
    origin: &str,
    seqno: u64,
    adjacencies: &[(&str, &str, u64)],
) -> Lsa {
    Lsa::Adjacency(AdjacencyLsa::new(
        LsaHdr::new(name(origin), seqno, expiration()),
        adjacencies
            .iter()
            .map(|(neighbor, face_uri, cost)| {
                Adjacency::new(name(neighbor), (*face_uri).to_owned(), *cost)
            })
            .collect(),
    ))
}

pub fn coordinate_lsa(
    origin: &str,
    seqno: u64,
    radius: f64,
    angles: &[f64],
) -> Lsa {
    Lsa::Coordinate(CoordinateLsa::new(
        LsaHdr::new(name(origin), seqno, expiration()),
        radius,
        angles.to_vec(),
    ))
}

pub fn nexthops(hops: &[(&str, f64)]) -> NexthopList {
    let mut list = NexthopList::default();
    for (face_uri, cost) in hops {
        list.add(Nexthop::new((*face_uri).to_owned(), *cost));
    }
    list
}
