//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet};

use nlsr_utils::name::Name;

use crate::collections::{Arena, Lsdb};
use crate::config::InstanceCfg;
use crate::debug::Debug;
use crate::fib::Fib;
use crate::lsdb::{LsaEntry, LsdbUpdate};
use crate::packet::lsa::Lsa;
use crate::route;
use crate::route::{NexthopList, RoutingTable, RoutingTableEntry};

// Name Prefix Table.
//
// Cross-index from advertised name prefixes to the routers that originate
// them. The routing pool entries are owned by the table and identified by
// router name; each pool entry keeps a back-index of the prefixes citing
// it, populated on insert and pruned on delete.
#[derive(Debug, Default)]
pub struct NamePrefixTable {
    pub entries: BTreeMap<Name, NptEntry>,
    pub rtpool: BTreeMap<Name, RoutingPoolEntry>,
    pub mc_groups: BTreeMap<Name, MulticastGroup>,
}

// Name prefix entry.
//
// Present iff at least one router originates the prefix. The entry is
// retained even when its next-hop list is empty, since a future routing
// change may bring hops back.
#[derive(Debug)]
pub struct NptEntry {
    pub prefix: Name,
    pub multicast: bool,
    // Destination routers cited by this prefix (keys into the pool).
    pub rtes: BTreeSet<Name>,
    // Effective next hops, merged across all cited pool entries.
    pub nexthops: NexthopList,
}

// Routing table pool entry (RTPE).
//
// One shared record per destination router, holding its current next-hop
// list. Exists iff at least one NPT entry references it.
#[derive(Debug)]
pub struct RoutingPoolEntry {
    pub destination: Name,
    pub nexthops: NexthopList,
    // Weak back-index: prefixes whose entries cite this router.
    pub npt_entries: BTreeSet<Name>,
}

// Multicast group entry.
#[derive(Debug)]
pub struct MulticastGroup {
    pub name: Name,
    pub members: BTreeSet<Name>,
    // Faces toward the current multicast tree.
    pub nexthops: NexthopList,
}

// ===== helper functions =====

// Recomputes an entry's next hops as the union-by-best-cost of the
// next-hop lists across all pool entries it cites.
fn generate_nexthops(
    entry: &mut NptEntry,
    rtpool: &BTreeMap<Name, RoutingPoolEntry>,
) {
    let mut nexthops = NexthopList::default();
    for origin in &entry.rtes {
        if let Some(rtpe) = rtpool.get(origin) {
            nexthops.merge(&rtpe.nexthops);
        }
    }
    entry.nexthops = nexthops;
}

// Projects an entry into the FIB.
fn project(fib: &mut Fib, entry: &NptEntry) {
    if !entry.nexthops.is_empty() {
        fib.update(entry.prefix.clone(), &entry.nexthops);
    } else {
        fib.remove(&entry.prefix);
    }
}

// ===== global functions =====

// Applies an LSDB modification to the table.
pub fn process_lsdb_event(
    config: &InstanceCfg,
    npt: &mut NamePrefixTable,
    fib: &mut Fib,
    routing_table: &RoutingTable,
    lsdb: &Lsdb,
    lsa_entries: &Arena<LsaEntry>,
    lsa: &Lsa,
    kind: LsdbUpdate,
    add_names: &BTreeSet<Name>,
    remove_names: &BTreeSet<Name>,
    add_mc_names: &BTreeSet<Name>,
    remove_mc_names: &BTreeSet<Name>,
) {
    let origin = &lsa.hdr().origin_router;

    // Our own LSAs don't feed the table.
    if origin == &config.router_name {
        return;
    }

    match kind {
        LsdbUpdate::Installed => {
            // The router name itself is always addressable as a prefix.
            add_entry(
                npt,
                fib,
                routing_table,
                origin.clone(),
                origin.clone(),
                false,
            );

            if let Lsa::Name(lsa) = lsa {
                for name in
                    lsa.names.iter().filter(|name| *name != &config.router_name)
                {
                    add_entry(
                        npt,
                        fib,
                        routing_table,
                        name.clone(),
                        origin.clone(),
                        false,
                    );
                }
                if config.multicast_routing {
                    for name in lsa
                        .mc_names
                        .iter()
                        .filter(|name| *name != &config.router_name)
                    {
                        add_multicast_entry(
                            config,
                            npt,
                            fib,
                            lsdb,
                            lsa_entries,
                            name.clone(),
                            origin.clone(),
                        );
                    }
                }
            }
        }
        LsdbUpdate::Updated => {
            if !matches!(lsa, Lsa::Name(_)) {
                return;
            }

            for name in add_names
                .iter()
                .filter(|name| *name != &config.router_name)
            {
                add_entry(
                    npt,
                    fib,
                    routing_table,
                    name.clone(),
                    origin.clone(),
                    false,
                );
            }
            if config.multicast_routing {
                for name in add_mc_names
                    .iter()
                    .filter(|name| *name != &config.router_name)
                {
                    add_multicast_entry(
                        config,
                        npt,
                        fib,
                        lsdb,
                        lsa_entries,
                        name.clone(),
                        origin.clone(),
                    );
                }
            }

            for name in remove_names
                .iter()
                .filter(|name| *name != &config.router_name)
            {
                remove_entry(npt, fib, name, origin);
            }
            if config.multicast_routing {
                for name in remove_mc_names
                    .iter()
                    .filter(|name| *name != &config.router_name)
                {
                    remove_multicast_entry(
                        config,
                        npt,
                        fib,
                        lsdb,
                        lsa_entries,
                        name,
                        origin,
                    );
                }
            }
        }
        LsdbUpdate::Removed => {
            remove_entry(npt, fib, origin, origin);

            if let Lsa::Name(lsa) = lsa {
                for name in
                    lsa.names.iter().filter(|name| *name != &config.router_name)
                {
                    remove_entry(npt, fib, name, origin);
                }
                if config.multicast_routing {
                    for name in lsa
                        .mc_names
                        .iter()
                        .filter(|name| *name != &config.router_name)
                    {
                        remove_multicast_entry(
                            config,
                            npt,
                            fib,
                            lsdb,
                            lsa_entries,
                            name,
                            origin,
                        );
                    }
                }
            }
        }
    }
}

// Associates a name prefix with an originating router.
pub fn add_entry(
    npt: &mut NamePrefixTable,
    fib: &mut Fib,
    routing_table: &RoutingTable,
    prefix: Name,
    origin: Name,
    multicast: bool,
) {
    Debug::NptAddEntry(&prefix, &origin).log();
    let NamePrefixTable { entries, rtpool, .. } = npt;

    // Look up or create the pool entry, seeding its next hops from the
    // routing table. An unreachable destination yields an empty list.
    let rtpe = rtpool.entry(origin.clone()).or_insert_with(|| {
        let nexthops = routing_table
            .get(&origin)
            .map(|rte| rte.nexthops.clone())
            .unwrap_or_default();
        RoutingPoolEntry {
            destination: origin.clone(),
            nexthops,
            npt_entries: Default::default(),
        }
    });
    rtpe.npt_entries.insert(prefix.clone());

    // Look up or create the prefix entry and associate both directions.
    let entry = entries.entry(prefix.clone()).or_insert_with(|| NptEntry {
        prefix,
        multicast,
        rtes: Default::default(),
        nexthops: Default::default(),
    });
    entry.rtes.insert(origin);

    generate_nexthops(entry, rtpool);
    project(fib, entry);
}

// Dissociates a name prefix from an originating router.
pub fn remove_entry(
    npt: &mut NamePrefixTable,
    fib: &mut Fib,
    prefix: &Name,
    origin: &Name,
) {
    Debug::NptRemoveEntry(prefix, origin).log();
    let NamePrefixTable { entries, rtpool, .. } = npt;

    // Detach the pool entry; collect it once nothing cites it anymore.
    let rtpe_gone = match rtpool.get_mut(origin) {
        Some(rtpe) => {
            rtpe.npt_entries.remove(prefix);
            rtpe.npt_entries.is_empty()
        }
        None => return,
    };
    if rtpe_gone {
        rtpool.remove(origin);
    }

    let mut delete_entry = false;
    if let Some(entry) = entries.get_mut(prefix) {
        entry.rtes.remove(origin);
        if entry.rtes.is_empty() {
            delete_entry = true;
        } else {
            generate_nexthops(entry, rtpool);
            project(fib, entry);
        }
    }
    if delete_entry {
        entries.remove(prefix);
        fib.remove(prefix);
    }
}

// Adds a member router to a multicast group, creating the group if new.
pub fn add_multicast_entry(
    config: &InstanceCfg,
    npt: &mut NamePrefixTable,
    fib: &mut Fib,
    lsdb: &Lsdb,
    lsa_entries: &Arena<LsaEntry>,
    name: Name,
    member: Name,
) {
    Debug::NptMcJoin(&name, &member).log();
    let group =
        npt.mc_groups.entry(name.clone()).or_insert_with(|| MulticastGroup {
            name,
            members: Default::default(),
            nexthops: Default::default(),
        });

    // Rebuild only when the membership actually changes.
    if group.members.insert(member) {
        rebuild_multicast_tree(config, group, fib, lsdb, lsa_entries);
    }
}

// Removes a member router from a multicast group. The group is deleted
// once its last member leaves.
pub fn remove_multicast_entry(
    config: &InstanceCfg,
    npt: &mut NamePrefixTable,
    fib: &mut Fib,
    lsdb: &Lsdb,
    lsa_entries: &Arena<LsaEntry>,
    name: &Name,
    member: &Name,
) {
    // Leaving an unknown group, or a group the router isn't a member of,
    // is a no-op.
    let empty = match npt.mc_groups.get_mut(name) {
        Some(group) => {
            if !group.members.remove(member) {
                return;
            }
            Debug::NptMcLeave(name, member).log();
            rebuild_multicast_tree(config, group, fib, lsdb, lsa_entries);
            group.members.is_empty()
        }
        None => return,
    };
    if empty {
        npt.mc_groups.remove(name);
    }
}

// Recomputes a group's tree and projects the resulting faces.
pub fn rebuild_multicast_tree(
    config: &InstanceCfg,
    group: &mut MulticastGroup,
    fib: &mut Fib,
    lsdb: &Lsdb,
    lsa_entries: &Arena<LsaEntry>,
) {
    group.nexthops = route::calculate_multicast_nexthops(
        config,
        &group.members,
        lsdb,
        lsa_entries,
    );
    if !group.nexthops.is_empty() {
        fib.update(group.name.clone(), &group.nexthops);
    } else {
        fib.remove(&group.name);
    }
}

// Rebuilds every multicast group's tree.
pub fn rebuild_multicast_trees(
    config: &InstanceCfg,
    npt: &mut NamePrefixTable,
    fib: &mut Fib,
    lsdb: &Lsdb,
    lsa_entries: &Arena<LsaEntry>,
) {
    for group in npt.mc_groups.values_mut() {
        rebuild_multicast_tree(config, group, fib, lsdb, lsa_entries);
    }
}

// Applies a freshly computed routing table to the pool.
//
// Pool entries whose next hops changed, or whose destination disappeared,
// are rewritten and every prefix citing them is reprojected. Multicast
// trees are then rebuilt unconditionally; that's simpler than working out
// which trees a given change affects.
pub fn update_with_new_route(
    config: &InstanceCfg,
    npt: &mut NamePrefixTable,
    fib: &mut Fib,
    routing_table: &RoutingTable,
    lsdb: &Lsdb,
    lsa_entries: &Arena<LsaEntry>,
    new_entries: &[RoutingTableEntry],
) {
    let mut dirty = vec![];
    for (destination, rtpe) in npt.rtpool.iter_mut() {
        let fresh = new_entries
            .iter()
            .find(|entry| &entry.destination == destination);
        match fresh {
            Some(entry) if rtpe.nexthops != entry.nexthops => {
                rtpe.nexthops = entry.nexthops.clone();
                dirty.extend(
                    rtpe.npt_entries
                        .iter()
                        .map(|prefix| (prefix.clone(), destination.clone())),
                );
            }
            None => {
                // The destination is no longer reachable.
                rtpe.nexthops.clear();
                dirty.extend(
                    rtpe.npt_entries
                        .iter()
                        .map(|prefix| (prefix.clone(), destination.clone())),
                );
            }
            _ => (),
        }
    }

    for (prefix, origin) in dirty {
        let multicast = npt
            .entries
            .get(&prefix)
            .is_some_and(|entry| entry.multicast);
        add_entry(npt, fib, routing_table, prefix, origin, multicast);
    }

    rebuild_multicast_trees(config, npt, fib, lsdb, lsa_entries);
}
