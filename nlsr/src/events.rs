//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::Bytes;
use nlsr_utils::name::Name;
use nlsr_utils::southbound::FibResponseMsg;

use crate::debug::Debug;
use crate::error::Error;
use crate::ibus::IbusMsg;
use crate::instance::{InstanceArenas, InstanceState, InstanceUpView, Neighbor};
use crate::lsdb::LsaEntryFlags;
use crate::packet::consts::LsaType;
use crate::packet::lsa::Lsa;
use crate::tasks::messages::input::{
    AdjacencyStatusMsg, LsaExpiryMsg, LsaRefreshMsg, PrefixUpdateMsg,
    ProtocolMsg as ProtocolInputMsg,
};
use crate::{lsdb, npt, route, sync};

// ===== Protocol event dispatch =====

pub(crate) fn process_protocol_msg(
    instance: &mut InstanceUpView<'_>,
    arenas: &mut InstanceArenas,
    msg: ProtocolInputMsg,
) -> Result<(), Error> {
    match msg {
        ProtocolInputMsg::LsaRx(msg) => {
            process_lsa_rx(instance, arenas, msg.interest_name, msg.bytes)
        }
        ProtocolInputMsg::SyncUpdate(msg) => {
            sync::process_remote_update(
                instance,
                &arenas.lsa_entries,
                &msg.update_name,
                msg.seqno,
            );
            Ok(())
        }
        ProtocolInputMsg::SyncRemoval(msg) => {
            sync::process_remote_removal(&msg.update_name);
            Ok(())
        }
        ProtocolInputMsg::AdjacencyStatus(msg) => {
            process_adjacency_status(instance, arenas, msg)
        }
        ProtocolInputMsg::PrefixUpdate(msg) => {
            process_prefix_update(instance, arenas, msg)
        }
        ProtocolInputMsg::LsaExpiry(msg) => {
            process_lsa_expiry(instance, arenas, msg)
        }
        ProtocolInputMsg::LsaRefresh(msg) => {
            process_lsa_refresh(instance, arenas, msg)
        }
        ProtocolInputMsg::FetchTimeout(msg) => {
            sync::process_fetch_timeout(instance, msg.interest_name);
            Ok(())
        }
        ProtocolInputMsg::RoutingCalc(_) => {
            process_routing_calc(instance, arenas)
        }
        ProtocolInputMsg::FibResponse(msg) => {
            process_fib_response(instance, msg)
        }
        ProtocolInputMsg::FibRetry(msg) => {
            instance.state.fib.process_retry(msg.id);
            Ok(())
        }
    }
}

// ===== LSA receipt =====

fn process_lsa_rx(
    instance: &mut InstanceUpView<'_>,
    arenas: &mut InstanceArenas,
    interest_name: Name,
    bytes: Bytes,
) -> Result<(), Error> {
    // The fetch completed; cancel its deadline.
    instance.state.pending_fetches.remove(&interest_name);

    // A decoding failure aborts this LSA only.
    let lsa = Lsa::decode(bytes)
        .map_err(|error| Error::LsaDecodeError(interest_name, error))?;

    // Seeing our own LSA echoed back with a sequence number at least as
    // high as the local one means a stale instance of this router is
    // circulating; jump past it and re-advertise.
    let hdr = lsa.hdr();
    if hdr.origin_router == instance.config.router_name {
        let lsa_type = lsa.lsa_type();
        if hdr.seqno >= instance.state.seqmgr.get(lsa_type) {
            instance.state.seqmgr.raise(lsa_type, hdr.seqno);
            match lsa_type {
                LsaType::Name => {
                    lsdb::originate_name_lsa(instance, &mut arenas.lsa_entries)
                }
                LsaType::Adjacency => lsdb::originate_adjacency_lsa(
                    instance,
                    &mut arenas.lsa_entries,
                ),
                LsaType::Coordinate => lsdb::originate_coordinate_lsa(
                    instance,
                    &mut arenas.lsa_entries,
                ),
            }
        }
        return Ok(());
    }

    let key = lsa.key();
    lsdb::install(instance, &mut arenas.lsa_entries, lsa);
    if let Some((_, lse)) =
        instance.state.lsdb.get_mut(&mut arenas.lsa_entries, &key)
    {
        lse.flags.insert(LsaEntryFlags::RECEIVED);
    }
    Ok(())
}

// ===== Adjacency liveness =====

fn process_adjacency_status(
    instance: &mut InstanceUpView<'_>,
    arenas: &mut InstanceArenas,
    msg: AdjacencyStatusMsg,
) -> Result<(), Error> {
    Debug::AdjacencyChange(&msg.neighbor, msg.up).log();

    let neighbor = instance
        .state
        .neighbors
        .entry(msg.neighbor.clone())
        .or_insert_with(|| Neighbor {
            name: msg.neighbor.clone(),
            face_uri: msg.face_uri.clone(),
            cost: msg.cost,
            up: false,
        });
    let changed = neighbor.up != msg.up
        || neighbor.face_uri != msg.face_uri
        || neighbor.cost != msg.cost;
    neighbor.face_uri = msg.face_uri;
    neighbor.cost = msg.cost;
    neighbor.up = msg.up;

    if changed {
        lsdb::originate_adjacency_lsa(instance, &mut arenas.lsa_entries);
    }
    Ok(())
}

// ===== Local prefix advertisement =====

fn process_prefix_update(
    instance: &mut InstanceUpView<'_>,
    arenas: &mut InstanceArenas,
    msg: PrefixUpdateMsg,
) -> Result<(), Error> {
    let names = if msg.multicast {
        &mut instance.state.advertised_mc_names
    } else {
        &mut instance.state.advertised_names
    };
    let changed = if msg.advertise {
        names.insert(msg.name)
    } else {
        names.remove(&msg.name)
    };

    if changed {
        lsdb::originate_name_lsa(instance, &mut arenas.lsa_entries);
    }
    Ok(())
}

// ===== LSA expiration and refresh =====

fn process_lsa_expiry(
    instance: &mut InstanceUpView<'_>,
    arenas: &mut InstanceArenas,
    msg: LsaExpiryMsg,
) -> Result<(), Error> {
    let (_, lse) = instance
        .state
        .lsdb
        .get_by_key(&arenas.lsa_entries, &msg.lse_key)?;
    let key = lse.data.key();
    Debug::LsaExpire(&key).log();
    instance.state.counters.lsa_expirations += 1;

    lsdb::remove(instance, &mut arenas.lsa_entries, &key);
    Ok(())
}

fn process_lsa_refresh(
    instance: &mut InstanceUpView<'_>,
    arenas: &mut InstanceArenas,
    msg: LsaRefreshMsg,
) -> Result<(), Error> {
    let (_, lse) = instance
        .state
        .lsdb
        .get_by_key(&arenas.lsa_entries, &msg.lse_key)?;
    let lse_id = lse.id;

    lsdb::refresh(instance, &mut arenas.lsa_entries, lse_id);
    Ok(())
}

// ===== Routing table calculation =====

fn process_routing_calc(
    instance: &mut InstanceUpView<'_>,
    arenas: &mut InstanceArenas,
) -> Result<(), Error> {
    instance.state.routing_calc_timer = None;
    Debug::RoutingCalcStart.log();

    let table =
        route::calculate(instance.config, &instance.state.lsdb, &arenas.lsa_entries);
    Debug::RoutingCalcFinish(table.entries.len()).log();

    instance.state.routing_table = table;
    instance.state.counters.routing_calc_runs += 1;

    let entries = instance.state.routing_table.iter().cloned().collect();
    let _ = instance.tx.ibus.send(IbusMsg::RoutingChanged { entries });
    Ok(())
}

// ===== Forwarder acknowledgments =====

fn process_fib_response(
    instance: &mut InstanceUpView<'_>,
    msg: FibResponseMsg,
) -> Result<(), Error> {
    if instance.state.fib.process_response(msg.id, msg.success) {
        instance.state.counters.fib_command_failures += 1;
    }
    Ok(())
}

// ===== Internal bus dispatch =====

pub(crate) fn process_ibus_msg(
    instance: &mut InstanceUpView<'_>,
    arenas: &mut InstanceArenas,
    msg: IbusMsg,
) {
    match msg {
        IbusMsg::LsdbEvent {
            lsa,
            kind,
            add_names,
            remove_names,
            add_mc_names,
            remove_mc_names,
        } => {
            let InstanceState {
                lsdb,
                npt,
                fib,
                routing_table,
                ..
            } = &mut *instance.state;
            npt::process_lsdb_event(
                instance.config,
                npt,
                fib,
                routing_table,
                lsdb,
                &arenas.lsa_entries,
                &lsa,
                kind,
                &add_names,
                &remove_names,
                &add_mc_names,
                &remove_mc_names,
            );
        }
        IbusMsg::RoutingChanged { entries } => {
            let InstanceState {
                lsdb,
                npt,
                fib,
                routing_table,
                ..
            } = &mut *instance.state;
            npt::update_with_new_route(
                instance.config,
                npt,
                fib,
                routing_table,
                lsdb,
                &arenas.lsa_entries,
                &entries,
            );
        }
        // Telemetry for external subscribers; already logged and counted.
        IbusMsg::FibCommandFailed { .. } => (),
    }
}
