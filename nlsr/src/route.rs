//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet};

use derive_new::new;
use nlsr_utils::name::Name;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::collections::{Arena, Lsdb};
use crate::config::InstanceCfg;
use crate::lsdb::LsaEntry;
use crate::packet::LsaKey;
use crate::packet::consts::LsaType;
use crate::packet::lsa::AdjacencyLsa;
use crate::spf::{AdjMatrix, NodeId, SptCalculator, TopologyMap};

// Next hop toward a destination.
#[derive(Clone, Debug, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct Nexthop {
    pub face_uri: String,
    pub cost: f64,
}

// Next hops ordered by ascending cost, ties broken by face URI.
//
// At most one entry per face is kept, with the minimum cost.
#[derive(Clone, Debug, Default, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct NexthopList(SmallVec<[Nexthop; 4]>);

// Unicast routing table entry.
#[derive(Clone, Debug, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct RoutingTableEntry {
    pub destination: Name,
    pub nexthops: NexthopList,
}

// Unicast routing table: one entry per reachable destination router.
#[derive(Debug, Default)]
pub struct RoutingTable {
    pub entries: BTreeMap<Name, RoutingTableEntry>,
}

// ===== impl NexthopList =====

impl NexthopList {
    // Inserts a next hop, keeping the minimum cost per face.
    pub fn add(&mut self, nexthop: Nexthop) {
        if let Some(existing) = self
            .0
            .iter_mut()
            .find(|existing| existing.face_uri == nexthop.face_uri)
        {
            if nexthop.cost >= existing.cost {
                return;
            }
            existing.cost = nexthop.cost;
        } else {
            self.0.push(nexthop);
        }
        self.0.sort_by(|a, b| {
            a.cost
                .total_cmp(&b.cost)
                .then_with(|| a.face_uri.cmp(&b.face_uri))
        });
    }

    // Merges another list into this one, per-face minimum cost winning.
    pub fn merge(&mut self, other: &NexthopList) {
        for nexthop in other.iter() {
            self.add(nexthop.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Nexthop> + '_ {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

// ===== impl RoutingTable =====

impl RoutingTable {
    pub fn get(&self, destination: &Name) -> Option<&RoutingTableEntry> {
        self.entries.get(destination)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoutingTableEntry> + '_ {
        self.entries.values()
    }
}

// ===== global functions =====

// Recomputes the unicast routing table from the current LSDB.
//
// The topology map is regenerated for this computation and dropped when it
// completes.
pub fn calculate(
    config: &InstanceCfg,
    lsdb: &Lsdb,
    lsa_entries: &Arena<LsaEntry>,
) -> RoutingTable {
    let own_key =
        LsaKey::new(config.router_name.clone(), LsaType::Adjacency);
    let Some((_, own_lse)) = lsdb.get(lsa_entries, &own_key) else {
        // Without a local AdjacencyLSA nothing is reachable.
        return RoutingTable::default();
    };
    let own_adj = own_lse.data.as_adjacency().unwrap();

    let map = TopologyMap::from_lsdb(lsdb, lsa_entries);
    if config.hyperbolic_routing {
        calculate_hyperbolic(config, &map, lsdb, lsa_entries, own_adj)
    } else {
        let matrix = AdjMatrix::from_lsdb(&map, lsdb, lsa_entries);
        calculate_link_state(config, &map, &matrix, own_adj)
    }
}

// Link-state calculation.
//
// One shortest-path run per first-hop neighbor, over a matrix restricted to
// that neighbor as the root's only outgoing link. A destination's next-hop
// list then contains every neighbor whose restricted distance matches the
// overall best, so all equal-cost first hops are used.
fn calculate_link_state(
    config: &InstanceCfg,
    map: &TopologyMap,
    matrix: &AdjMatrix,
    own_adj: &AdjacencyLsa,
) -> RoutingTable {
    let mut table = RoutingTable::default();
    let Some(root) = map.node_id(&config.router_name) else {
        return table;
    };

    // Distances obtained through each first-hop neighbor.
    let mut first_hops = vec![];
    for adjacency in &own_adj.adjacencies {
        let Some(neighbor_id) = map.node_id(&adjacency.neighbor) else {
            continue;
        };
        // Skip adjacencies absent from the symmetric closure.
        if matrix.cost(root, neighbor_id) < 0.0 {
            continue;
        }

        let restricted = matrix.restrict_root(root, neighbor_id);
        let mut calc = SptCalculator::new(&restricted);
        calc.calculate_tree(root, &BTreeSet::new());
        let distances = (0..map.len())
            .map(|node| calc.distance(node))
            .collect::<Vec<_>>();
        first_hops.push((adjacency.face_uri.clone(), distances));
    }

    for (dest_id, dest_name) in map.iter().filter(|(id, _)| *id != root) {
        let Some(best) = first_hops
            .iter()
            .filter_map(|(_, distances)| distances[dest_id])
            .min_by(f64::total_cmp)
        else {
            continue;
        };

        let mut nexthops = NexthopList::default();
        for (face_uri, distances) in &first_hops {
            if distances[dest_id] == Some(best) {
                nexthops.add(Nexthop::new(face_uri.clone(), best));
            }
        }
        table.entries.insert(
            dest_name.clone(),
            RoutingTableEntry::new(dest_name.clone(), nexthops),
        );
    }

    table
}

// Hyperbolic calculation.
//
// Per destination, each neighbor is ranked by the distance oracle applied
// from the neighbor to the destination. Routers without coordinates simply
// contribute no paths.
fn calculate_hyperbolic(
    config: &InstanceCfg,
    map: &TopologyMap,
    lsdb: &Lsdb,
    lsa_entries: &Arena<LsaEntry>,
    own_adj: &AdjacencyLsa,
) -> RoutingTable {
    let mut table = RoutingTable::default();

    for (_, dest_name) in
        map.iter().filter(|(_, name)| *name != &config.router_name)
    {
        let mut nexthops = NexthopList::default();
        for adjacency in &own_adj.adjacencies {
            let Some(distance) = hyperbolic_distance(
                lsdb,
                lsa_entries,
                &adjacency.neighbor,
                dest_name,
            ) else {
                continue;
            };
            nexthops.add(Nexthop::new(adjacency.face_uri.clone(), distance));
        }
        if !nexthops.is_empty() {
            table.entries.insert(
                dest_name.clone(),
                RoutingTableEntry::new(dest_name.clone(), nexthops),
            );
        }
    }

    table
}

// Computes the next hops toward a multicast group.
//
// The shortest-path tree rooted at the local router is limited to the
// group members and pruned of non-member leaves; the next hops are the
// faces attached to the root's direct children in the pruned tree.
pub fn calculate_multicast_nexthops(
    config: &InstanceCfg,
    members: &BTreeSet<Name>,
    lsdb: &Lsdb,
    lsa_entries: &Arena<LsaEntry>,
) -> NexthopList {
    let mut nexthops = NexthopList::default();

    let own_key =
        LsaKey::new(config.router_name.clone(), LsaType::Adjacency);
    let Some((_, own_lse)) = lsdb.get(lsa_entries, &own_key) else {
        return nexthops;
    };
    let own_adj = own_lse.data.as_adjacency().unwrap();

    let map = TopologyMap::from_lsdb(lsdb, lsa_entries);
    let matrix = AdjMatrix::from_lsdb(&map, lsdb, lsa_entries);
    let Some(root) = map.node_id(&config.router_name) else {
        return nexthops;
    };

    // Members missing from the topology contribute nothing until their
    // adjacencies appear.
    let included = std::iter::once(root)
        .chain(members.iter().filter_map(|member| map.node_id(member)))
        .collect::<BTreeSet<_>>();

    let mut calc = SptCalculator::new(&matrix);
    let tree = calc.calculate_tree(root, &included);

    for child in tree.children(root) {
        let Some(neighbor) = map.name(child) else {
            continue;
        };
        let Some(adjacency) = own_adj.adjacency(neighbor) else {
            continue;
        };
        let Some(cost) = calc.distance(child) else {
            continue;
        };
        nexthops.add(Nexthop::new(adjacency.face_uri.clone(), cost));
    }

    nexthops
}

// Hyperbolic distance oracle over the CoordinateLSAs in the LSDB.
pub fn hyperbolic_distance(
    lsdb: &Lsdb,
    lsa_entries: &Arena<LsaEntry>,
    from: &Name,
    to: &Name,
) -> Option<f64> {
    if from == to {
        return Some(0.0);
    }

    let coordinate = |router: &Name| {
        let key = LsaKey::new(router.clone(), LsaType::Coordinate);
        lsdb.get(lsa_entries, &key)
            .and_then(|(_, lse)| lse.data.as_coordinate())
            .map(|lsa| (lsa.radius, lsa.angles.clone()))
    };
    let (r1, angles1) = coordinate(from)?;
    let (r2, angles2) = coordinate(to)?;

    let delta = angular_distance(&angles1, &angles2)?;
    let distance =
        (r1.cosh() * r2.cosh() - r1.sinh() * r2.sinh() * delta.cos()).acosh();
    distance.is_finite().then_some(distance)
}

// Angle between two points given in hyperspherical coordinates.
fn angular_distance(angles1: &[f64], angles2: &[f64]) -> Option<f64> {
    if angles1.is_empty() || angles1.len() != angles2.len() {
        return None;
    }

    let v1 = unit_vector(angles1);
    let v2 = unit_vector(angles2);
    let inner = v1
        .iter()
        .zip(v2.iter())
        .map(|(a, b)| a * b)
        .sum::<f64>();
    Some(inner.clamp(-1.0, 1.0).acos())
}

fn unit_vector(angles: &[f64]) -> Vec<f64> {
    let mut vector = vec![];
    let mut sin_product = 1.0;
    for angle in angles {
        vector.push(sin_product * angle.cos());
        sin_product *= angle.sin();
    }
    vector.push(sin_product);
    vector
}
