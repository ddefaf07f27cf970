//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use nlsr_utils::name::Name;
use rand::Rng;

use crate::collections::{Arena, Lsdb};
use crate::debug::Debug;
use crate::error::Error;
use crate::instance::{InstanceUpView, PendingFetch};
use crate::lsdb::LsaEntry;
use crate::packet::LsaKey;
use crate::packet::consts::LsaType;
use crate::seqnum::SequencingManager;
use crate::tasks;
use crate::tasks::messages::output::{
    FetchLsaMsg, ProtocolMsg as ProtocolOutputMsg, SyncPublishMsg,
};

// How many times a fetch is re-expressed before giving up.
const MAX_FETCH_ATTEMPTS: u8 = 3;

// ===== global functions =====

// Handles a sync notification for a remote router.
//
// The combined sequence number is decomposed into the per-type
// sub-sequences; every type whose received value exceeds the stored one is
// fetched.
pub fn process_remote_update(
    instance: &mut InstanceUpView<'_>,
    lsa_entries: &Arena<LsaEntry>,
    update_name: &Name,
    seqno: u64,
) {
    Debug::SyncRx(update_name, seqno).log();

    // The update name carries the origin router name after the "LSA"
    // marker component.
    let Some(position) = update_name
        .components()
        .position(|component| component.as_bytes() == b"LSA")
    else {
        return;
    };
    let router_name = update_name.sub_name(position + 1);
    if router_name.is_empty() || router_name == instance.config.router_name {
        return;
    }

    let (name_seq, adj_seq, cor_seq) = SequencingManager::split(seqno);
    for (lsa_type, seq) in [
        (LsaType::Name, name_seq),
        (LsaType::Adjacency, adj_seq),
        (LsaType::Coordinate, cor_seq),
    ] {
        // A zero sub-sequence was never published.
        if seq == 0 {
            continue;
        }
        if is_lsa_new(&instance.state.lsdb, lsa_entries, &router_name, lsa_type, seq)
        {
            let interest_name = instance
                .config
                .chronosync_lsa_prefix
                .concat(&router_name)
                .append(&lsa_type.to_string())
                .append_number(seq);
            express_interest(instance, interest_name);
        }
    }
}

// Handles a sync session teardown for a remote router.
//
// Nothing to do: LSAs leave the LSDB through expiration, not through sync
// removals.
pub fn process_remote_removal(update_name: &Name) {
    Debug::SyncRemoval(update_name).log();
}

// Issues an LSA fetch with a deadline.
pub fn express_interest(
    instance: &mut InstanceUpView<'_>,
    interest_name: Name,
) {
    Debug::LsaFetch(&interest_name).log();

    let lifetime = instance.config.interest_resend_time;
    let deadline_timer = tasks::fetch_timeout_timer(
        interest_name.clone(),
        lifetime.into(),
        &instance.tx.protocol_input.fetch_timeout,
    );
    instance.state.pending_fetches.insert(
        interest_name.clone(),
        PendingFetch {
            attempts: 1,
            deadline_timer: Some(deadline_timer),
        },
    );

    let _ = instance.tx.protocol_output.send(ProtocolOutputMsg::FetchLsa(
        FetchLsaMsg {
            interest_name,
            lifetime,
        },
    ));
}

// Handles an expired fetch deadline: the fetch counts as a transient
// failure and is re-expressed with jitter, up to a bounded number of
// attempts.
pub fn process_fetch_timeout(
    instance: &mut InstanceUpView<'_>,
    interest_name: Name,
) {
    let Some(fetch) = instance.state.pending_fetches.get_mut(&interest_name)
    else {
        return;
    };

    if fetch.attempts >= MAX_FETCH_ATTEMPTS {
        instance.state.pending_fetches.remove(&interest_name);
        Error::LsaFetchExhausted(interest_name).log();
        return;
    }
    fetch.attempts += 1;
    Debug::LsaFetchRetry(&interest_name, fetch.attempts).log();

    let lifetime = instance.config.interest_resend_time;
    let jitter = rand::rng().random_range(0..=u64::from(lifetime) / 4);
    fetch.deadline_timer = Some(tasks::fetch_timeout_timer(
        interest_name.clone(),
        u64::from(lifetime) + jitter,
        &instance.tx.protocol_input.fetch_timeout,
    ));

    let _ = instance.tx.protocol_output.send(ProtocolOutputMsg::FetchLsa(
        FetchLsaMsg {
            interest_name,
            lifetime,
        },
    ));
}

// Publishes the local combined sequence number over the sync channel.
//
// The sequence file write gates the publication: a failed write aborts it
// and the error surfaces to the caller.
pub fn publish_local_update(
    instance: &mut InstanceUpView<'_>,
) -> Result<(), Error> {
    instance.state.seqmgr.write()?;

    let update_name = instance
        .config
        .chronosync_lsa_prefix
        .concat(&instance.config.router_name);
    let seqno = instance.state.seqmgr.combined();
    Debug::SyncPublish(&update_name, seqno).log();

    let _ = instance.tx.protocol_output.send(
        ProtocolOutputMsg::SyncPublish(SyncPublishMsg { update_name, seqno }),
    );
    Ok(())
}

// Tests whether a received sequence number is fresher than the stored LSA.
fn is_lsa_new(
    lsdb: &Lsdb,
    lsa_entries: &Arena<LsaEntry>,
    origin: &Name,
    lsa_type: LsaType,
    seqno: u64,
) -> bool {
    let key = LsaKey::new(origin.clone(), lsa_type);
    lsdb.get(lsa_entries, &key)
        .map(|(_, lse)| lse.data.hdr().seqno < seqno)
        .unwrap_or(true)
}
