//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;

use bitflags::bitflags;
use chrono::{DateTime, TimeDelta, Utc};
use nlsr_utils::name::Name;
use nlsr_utils::task::TimeoutTask;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::collections::{Arena, LsaEntryId};
use crate::config::InstanceCfg;
use crate::debug::Debug;
use crate::ibus::IbusMsg;
use crate::instance::InstanceUpView;
use crate::packet::LsaKey;
use crate::packet::consts::LsaType;
use crate::packet::lsa::{
    AdjacencyLsa, CoordinateLsa, Lsa, LsaHdr, NameLsa,
};
use crate::packet::tlv::Adjacency;
use crate::tasks::messages::input::LsaExpiryMsg;
use crate::{sync, tasks};

// LSA database entry.
#[derive(Debug)]
pub struct LsaEntry {
    // LSA entry ID.
    pub id: LsaEntryId,
    // LSA data.
    pub data: Lsa,
    // Timer triggered when the LSA expires.
    pub expiry_timer: Option<TimeoutTask>,
    // Timer for the periodic refresh of self-originated LSAs.
    pub refresh_timer: Option<TimeoutTask>,
    // LSA entry flags.
    pub flags: LsaEntryFlags,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct LsaEntryFlags: u8 {
        const RECEIVED = 0x01;
        const SELF_ORIGINATED = 0x02;
    }
}

// Outcome of an LSDB install operation.
#[derive(Debug, Eq, PartialEq)]
pub enum InstallOutcome {
    // No prior LSA was stored for the (origin, type) pair.
    Installed,
    // A fresher LSA replaced the stored one.
    Updated(NameDiff),
    // The sequence number isn't fresher than the stored one.
    Stale,
    // The LSA is malformed.
    Rejected,
}

// Kind of LSDB modification carried by LSDB events.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum LsdbUpdate {
    Installed,
    Updated,
    Removed,
}

// Set difference between two NameLSA advertisements.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NameDiff {
    pub add: BTreeSet<Name>,
    pub remove: BTreeSet<Name>,
    pub mc_add: BTreeSet<Name>,
    pub mc_remove: BTreeSet<Name>,
}

// ===== impl LsaEntry =====

impl LsaEntry {
    // Creates new LSA database entry.
    pub(crate) fn new(
        id: LsaEntryId,
        data: Lsa,
        lsa_expiryp: &UnboundedSender<LsaExpiryMsg>,
    ) -> LsaEntry {
        let expiry_timer = tasks::lsa_expiry_timer(id, &data, lsa_expiryp);

        LsaEntry {
            id,
            data,
            expiry_timer: Some(expiry_timer),
            refresh_timer: None,
            flags: Default::default(),
        }
    }
}

// ===== impl NameDiff =====

impl NameDiff {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty()
            && self.remove.is_empty()
            && self.mc_add.is_empty()
            && self.mc_remove.is_empty()
    }
}

// ===== helper functions =====

// Computes the set difference quadruple between two NameLSAs.
fn name_diff(old: &NameLsa, new: &NameLsa) -> NameDiff {
    NameDiff {
        add: new.names.difference(&old.names).cloned().collect(),
        remove: old.names.difference(&new.names).cloned().collect(),
        mc_add: new.mc_names.difference(&old.mc_names).cloned().collect(),
        mc_remove: old.mc_names.difference(&new.mc_names).cloned().collect(),
    }
}

// Expiration time for self-originated LSAs: twice the refresh interval.
fn expiration_time(config: &InstanceCfg) -> DateTime<Utc> {
    Utc::now() + TimeDelta::seconds(2 * config.lsa_refresh_time as i64)
}

// Installs a freshly built local LSA and schedules its refresh.
fn originate(
    instance: &mut InstanceUpView<'_>,
    lsa_entries: &mut Arena<LsaEntry>,
    lsa: Lsa,
) {
    Debug::LsaOriginate(&lsa).log();

    let key = lsa.key();
    install(instance, lsa_entries, lsa);

    if let Some((_, lse)) = instance.state.lsdb.get_mut(lsa_entries, &key) {
        lse.flags.insert(LsaEntryFlags::SELF_ORIGINATED);
        lse.refresh_timer = Some(tasks::lsa_refresh_timer(
            lse.id,
            instance.config.lsa_refresh_time,
            &instance.tx.protocol_input.lsa_refresh,
        ));
    }

    // Publish the new sequence number over the sync channel.
    if let Err(error) = sync::publish_local_update(instance) {
        error.log();
    }
}

// ===== global functions =====

// Installs the provided LSA to the LSDB.
//
// A stale sequence number leaves the database untouched; a fresher LSA
// replaces the stored one and consumers are notified with the resulting
// name prefix diff.
pub fn install(
    instance: &mut InstanceUpView<'_>,
    lsa_entries: &mut Arena<LsaEntry>,
    lsa: Lsa,
) -> InstallOutcome {
    if lsa.hdr().origin_router.is_empty() {
        return InstallOutcome::Rejected;
    }
    let key = lsa.key();

    // Remove the old instance of the LSA.
    let mut old_lsa = None;
    if let Some((lse_idx, lse)) = instance.state.lsdb.get(lsa_entries, &key) {
        if lsa.hdr().seqno <= lse.data.hdr().seqno {
            Debug::LsaStale(&key).log();
            return InstallOutcome::Stale;
        }
        let old_lse = instance.state.lsdb.delete(lsa_entries, lse_idx);
        old_lsa = Some(old_lse.data);
    }

    Debug::LsaInstall(&lsa).log();

    // Compute the per-name diff for NameLSA updates.
    let diff = match (&old_lsa, &lsa) {
        (Some(Lsa::Name(old)), Lsa::Name(new)) => name_diff(old, new),
        _ => NameDiff::default(),
    };

    // Add LSA entry to the LSDB.
    let (_, lse) = instance.state.lsdb.insert(
        lsa_entries,
        lsa,
        &instance.tx.protocol_input.lsa_expiry,
    );
    let lsa = lse.data.clone();
    instance.state.counters.lsa_installs += 1;

    // Notify consumers.
    let kind = match old_lsa {
        Some(_) => LsdbUpdate::Updated,
        None => LsdbUpdate::Installed,
    };
    let _ = instance.tx.ibus.send(IbusMsg::LsdbEvent {
        lsa,
        kind,
        add_names: diff.add.clone(),
        remove_names: diff.remove.clone(),
        add_mc_names: diff.mc_add.clone(),
        remove_mc_names: diff.mc_remove.clone(),
    });

    // Topology and coordinate changes feed the routing calculator.
    if matches!(key.lsa_type, LsaType::Adjacency | LsaType::Coordinate) {
        instance.schedule_routing_calc();
    }

    match kind {
        LsdbUpdate::Updated => InstallOutcome::Updated(diff),
        _ => InstallOutcome::Installed,
    }
}

// Removes the LSA stored for the given (origin, type) pair.
//
// Consumers receive the full prior LSA so they can diff against empty.
pub fn remove(
    instance: &mut InstanceUpView<'_>,
    lsa_entries: &mut Arena<LsaEntry>,
    key: &LsaKey,
) -> bool {
    let Some((lse_idx, _)) = instance.state.lsdb.get(lsa_entries, key) else {
        return false;
    };
    let lse = instance.state.lsdb.delete(lsa_entries, lse_idx);

    let _ = instance.tx.ibus.send(IbusMsg::LsdbEvent {
        lsa: lse.data,
        kind: LsdbUpdate::Removed,
        add_names: Default::default(),
        remove_names: Default::default(),
        add_mc_names: Default::default(),
        remove_mc_names: Default::default(),
    });

    if matches!(key.lsa_type, LsaType::Adjacency | LsaType::Coordinate) {
        instance.schedule_routing_calc();
    }

    true
}

// Builds and originates the local NameLSA.
pub fn originate_name_lsa(
    instance: &mut InstanceUpView<'_>,
    lsa_entries: &mut Arena<LsaEntry>,
) {
    let seqno = instance.state.seqmgr.increment(LsaType::Name);
    let hdr = LsaHdr::new(
        instance.config.router_name.clone(),
        seqno,
        expiration_time(instance.config),
    );
    let lsa = Lsa::Name(NameLsa::new(
        hdr,
        instance.state.advertised_names.clone(),
        instance.state.advertised_mc_names.clone(),
    ));
    originate(instance, lsa_entries, lsa);
}

// Builds and originates the local AdjacencyLSA from the adjacencies
// currently in the Up state.
pub fn originate_adjacency_lsa(
    instance: &mut InstanceUpView<'_>,
    lsa_entries: &mut Arena<LsaEntry>,
) {
    let adjacencies = instance
        .state
        .neighbors
        .values()
        .filter(|neighbor| neighbor.up)
        .map(|neighbor| {
            Adjacency::new(
                neighbor.name.clone(),
                neighbor.face_uri.clone(),
                neighbor.cost,
            )
        })
        .collect();

    let seqno = instance.state.seqmgr.increment(LsaType::Adjacency);
    let hdr = LsaHdr::new(
        instance.config.router_name.clone(),
        seqno,
        expiration_time(instance.config),
    );
    let lsa = Lsa::Adjacency(AdjacencyLsa::new(hdr, adjacencies));
    originate(instance, lsa_entries, lsa);
}

// Builds and originates the local CoordinateLSA, when coordinates are
// configured.
pub fn originate_coordinate_lsa(
    instance: &mut InstanceUpView<'_>,
    lsa_entries: &mut Arena<LsaEntry>,
) {
    let Some((radius, angles)) = instance.config.coordinates.clone() else {
        return;
    };

    let seqno = instance.state.seqmgr.increment(LsaType::Coordinate);
    let hdr = LsaHdr::new(
        instance.config.router_name.clone(),
        seqno,
        expiration_time(instance.config),
    );
    let lsa = Lsa::Coordinate(CoordinateLsa::new(hdr, radius, angles));
    originate(instance, lsa_entries, lsa);
}

pub fn originate_all(
    instance: &mut InstanceUpView<'_>,
    lsa_entries: &mut Arena<LsaEntry>,
) {
    originate_name_lsa(instance, lsa_entries);
    originate_adjacency_lsa(instance, lsa_entries);
    originate_coordinate_lsa(instance, lsa_entries);
}

// Refreshes a self-originated LSA: new sequence number, new expiration.
pub fn refresh(
    instance: &mut InstanceUpView<'_>,
    lsa_entries: &mut Arena<LsaEntry>,
    lse_id: LsaEntryId,
) {
    let Ok((_, lse)) = instance.state.lsdb.get_by_id(lsa_entries, lse_id)
    else {
        return;
    };
    if !lse.flags.contains(LsaEntryFlags::SELF_ORIGINATED) {
        return;
    }
    let key = lse.data.key();
    Debug::LsaRefresh(&key).log();

    match key.lsa_type {
        LsaType::Name => originate_name_lsa(instance, lsa_entries),
        LsaType::Adjacency => originate_adjacency_lsa(instance, lsa_entries),
        LsaType::Coordinate => {
            originate_coordinate_lsa(instance, lsa_entries)
        }
    }
}
