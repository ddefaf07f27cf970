//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet};

use nlsr_utils::name::Name;

use crate::collections::{Arena, Lsdb};
use crate::error::Error;
use crate::lsdb::LsaEntry;
use crate::packet::consts::LsaType;

// Dense node identifier valid for a single routing computation.
pub type NodeId = usize;

// Marker for a missing edge in the adjacency matrix.
pub const NO_EDGE: f64 = -1.0;

// Bijection between router names and dense node identifiers.
//
// Rebuilt from the current set of AdjacencyLSAs on every recalculation and
// dropped once the computation completes.
#[derive(Debug, Default)]
pub struct TopologyMap {
    names: Vec<Name>,
    ids: BTreeMap<Name, NodeId>,
}

// Weighted adjacency matrix over the mapped topology.
#[derive(Clone, Debug)]
pub struct AdjMatrix {
    n: usize,
    costs: Vec<f64>,
}

// Shortest-path-tree calculator.
//
// Runs a relaxation-based single-source shortest-path pass over the
// adjacency matrix, using a head/tail work queue with no random removal.
// A non-empty set of included nodes permits early exit once all of them
// have been finalized.
#[derive(Debug)]
pub struct SptCalculator<'a> {
    matrix: &'a AdjMatrix,
    queue: Vec<NodeId>,
    queue_head: usize,
    parents: Vec<Option<NodeId>>,
    distances: Vec<f64>,
}

// Tree produced by the SPT calculator.
//
// Nodes live in a slot arena and link to their parent and children through
// slot indices.
#[derive(Debug, Default)]
pub struct Tree {
    slots: Vec<Option<TreeNode>>,
    index: BTreeMap<NodeId, usize>,
    root: Option<usize>,
}

#[derive(Debug)]
pub struct TreeNode {
    pub value: NodeId,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

// ===== impl TopologyMap =====

impl TopologyMap {
    // Builds the map from the AdjacencyLSAs currently in the LSDB.
    //
    // Both origin routers and their listed neighbors are mapped, so LSAs
    // from routers whose own AdjacencyLSA hasn't arrived yet still resolve
    // to a node id.
    pub fn from_lsdb(
        lsdb: &Lsdb,
        lsa_entries: &Arena<LsaEntry>,
    ) -> TopologyMap {
        let mut map = TopologyMap::default();
        for lse in lsdb.iter_for_type(lsa_entries, LsaType::Adjacency) {
            let lsa = lse.data.as_adjacency().unwrap();
            map.insert(&lsa.hdr.origin_router);
            for adjacency in &lsa.adjacencies {
                map.insert(&adjacency.neighbor);
            }
        }
        map
    }

    fn insert(&mut self, name: &Name) -> NodeId {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = self.names.len();
        self.names.push(name.clone());
        self.ids.insert(name.clone(), id);
        id
    }

    pub fn node_id(&self, name: &Name) -> Option<NodeId> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: NodeId) -> Option<&Name> {
        self.names.get(id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    // Returns an iterator over all mapped routers.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Name)> + '_ {
        self.names.iter().enumerate()
    }
}

// ===== impl AdjMatrix =====

impl AdjMatrix {
    pub fn new(n: usize) -> AdjMatrix {
        let mut matrix = AdjMatrix {
            n,
            costs: vec![NO_EDGE; n * n],
        };
        for node in 0..n {
            matrix.set_cost(node, node, 0.0);
        }
        matrix
    }

    // Builds the matrix as the symmetric closure of the AdjacencyLSAs in
    // the LSDB.
    //
    // An edge exists only when both endpoints advertise each other. One-way
    // adjacencies are unused; adjacencies advertised with mismatching costs
    // are dropped and logged.
    pub fn from_lsdb(
        map: &TopologyMap,
        lsdb: &Lsdb,
        lsa_entries: &Arena<LsaEntry>,
    ) -> AdjMatrix {
        let mut matrix = AdjMatrix::new(map.len());

        for lse in lsdb.iter_for_type(lsa_entries, LsaType::Adjacency) {
            let lsa = lse.data.as_adjacency().unwrap();
            let origin = &lsa.hdr.origin_router;
            let Some(origin_id) = map.node_id(origin) else {
                continue;
            };
            for adjacency in &lsa.adjacencies {
                let neighbor = &adjacency.neighbor;
                let Some(neighbor_id) = map.node_id(neighbor) else {
                    continue;
                };

                // Fetch the reverse direction of the adjacency.
                let Some(back) = lsdb
                    .iter_for_type(lsa_entries, LsaType::Adjacency)
                    .filter_map(|lse| lse.data.as_adjacency())
                    .find(|lsa| &lsa.hdr.origin_router == neighbor)
                    .and_then(|lsa| lsa.adjacency(origin))
                else {
                    // One-way adjacency.
                    continue;
                };
                if back.cost != adjacency.cost {
                    if origin < neighbor {
                        Error::TopologyInconsistent(
                            origin.clone(),
                            neighbor.clone(),
                        )
                        .log();
                    }
                    continue;
                }

                matrix.set_cost(origin_id, neighbor_id, adjacency.cost as f64);
            }
        }

        matrix
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn cost(&self, u: NodeId, v: NodeId) -> f64 {
        self.costs[u * self.n + v]
    }

    pub fn set_cost(&mut self, u: NodeId, v: NodeId, cost: f64) {
        self.costs[u * self.n + v] = cost;
    }

    // Returns a copy of the matrix where the root keeps a single outgoing
    // link, toward the given neighbor. Used to compute the distances
    // obtained through each first hop.
    pub fn restrict_root(
        &self,
        root: NodeId,
        neighbor: NodeId,
    ) -> AdjMatrix {
        let mut matrix = self.clone();
        for node in 0..self.n {
            if node != root && node != neighbor {
                matrix.set_cost(root, node, NO_EDGE);
            }
        }
        matrix
    }
}

// ===== impl SptCalculator =====

impl<'a> SptCalculator<'a> {
    pub fn new(matrix: &'a AdjMatrix) -> SptCalculator<'a> {
        SptCalculator {
            matrix,
            queue: Vec::with_capacity(matrix.len()),
            queue_head: 0,
            parents: vec![None; matrix.len()],
            distances: vec![f64::INFINITY; matrix.len()],
        }
    }

    // Computes the shortest-path tree rooted at the given node.
    //
    // With a non-empty set of included nodes, the computation stops as soon
    // as all of them are on the tree, and the resulting tree is pruned of
    // every leaf that isn't included.
    pub fn calculate_tree(
        &mut self,
        root: NodeId,
        included: &BTreeSet<NodeId>,
    ) -> Tree {
        let limit = !included.is_empty();
        let mut remaining = included.clone();
        let mut tree = Tree::default();

        // Add root node to the tree and initialize the queue.
        self.enqueue(root, root, 0.0);
        tree.set_root(root);

        if limit && remaining.remove(&root) && remaining.is_empty() {
            return tree;
        }

        let mut head = self.queue[self.queue_head];
        loop {
            // Enqueue nodes adjacent to the current queue head.
            for node in 0..self.matrix.len() {
                let cost = self.matrix.cost(head, node);
                if cost < 0.0 {
                    continue;
                }
                self.enqueue(node, head, self.distances[head] + cost);
            }

            self.queue_head += 1;
            if self.queue_head < self.queue.len() {
                // Select the closest queued node and add it to the tree.
                self.sort_queue_by_distance();
                head = self.queue[self.queue_head];
                let parent = self.parents[head].unwrap();
                tree.add_child(parent, head);

                // Stop once the tree contains all included nodes.
                if limit && remaining.remove(&head) && remaining.is_empty() {
                    break;
                }
            } else {
                break;
            }
        }

        if limit {
            tree.prune_if(|node| !included.contains(&node));
        }
        tree
    }

    // Returns the distance from the root to a finalized node.
    pub fn distance(&self, node: NodeId) -> Option<f64> {
        self.distances
            .get(node)
            .copied()
            .filter(|distance| distance.is_finite())
    }

    fn enqueue(&mut self, node: NodeId, parent: NodeId, distance: f64) {
        // Already finalized.
        if self.queue[..self.queue_head].contains(&node) {
            return;
        }

        // Still queued: keep the better path.
        if self.queue[self.queue_head..].contains(&node) {
            if distance < self.distances[node] {
                self.parents[node] = Some(parent);
                self.distances[node] = distance;
            }
            return;
        }

        self.queue.push(node);
        self.parents[node] = Some(parent);
        self.distances[node] = distance;
    }

    fn sort_queue_by_distance(&mut self) {
        let distances = &self.distances;
        self.queue[self.queue_head..]
            .sort_by(|a, b| distances[*a].total_cmp(&distances[*b]));
    }
}

// ===== impl Tree =====

impl Tree {
    pub fn set_root(&mut self, value: NodeId) {
        let slot = self.alloc(value, None);
        self.root = Some(slot);
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        let parent_slot = self.index[&parent];
        let child_slot = self.alloc(child, Some(parent_slot));
        if let Some(parent) = &mut self.slots[parent_slot] {
            parent.children.push(child_slot);
        }
    }

    fn alloc(&mut self, value: NodeId, parent: Option<usize>) -> usize {
        let slot = self.slots.len();
        self.slots.push(Some(TreeNode {
            value,
            parent,
            children: vec![],
        }));
        self.index.insert(value, slot);
        slot
    }

    pub fn get(&self, value: NodeId) -> Option<&TreeNode> {
        self.index
            .get(&value)
            .and_then(|slot| self.slots[*slot].as_ref())
    }

    pub fn contains(&self, value: NodeId) -> bool {
        self.get(value).is_some()
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.and_then(|slot| self.slots[slot].as_ref())
    }

    // Returns the parent value of a node.
    pub fn parent(&self, value: NodeId) -> Option<NodeId> {
        self.get(value)
            .and_then(|node| node.parent)
            .and_then(|slot| self.slots[slot].as_ref())
            .map(|node| node.value)
    }

    // Returns an iterator over all live tree nodes.
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> + '_ {
        self.slots.iter().flatten()
    }

    // Returns an iterator over the children values of a node.
    pub fn children(&self, value: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.get(value)
            .into_iter()
            .flat_map(|node| node.children.iter())
            .filter_map(|slot| self.slots[*slot].as_ref())
            .map(|node| node.value)
    }

    // Removes leaves satisfying the predicate, bottom-up, until none is
    // left.
    pub fn prune_if<F>(&mut self, predicate: F)
    where
        F: Fn(NodeId) -> bool,
    {
        loop {
            let victims = self
                .slots
                .iter()
                .enumerate()
                .filter_map(|(slot, node)| {
                    node.as_ref().map(|node| (slot, node))
                })
                .filter(|(_, node)| {
                    node.children.is_empty() && predicate(node.value)
                })
                .map(|(slot, _)| slot)
                .collect::<Vec<_>>();
            if victims.is_empty() {
                break;
            }
            for slot in victims {
                self.remove(slot);
            }
        }
    }

    fn remove(&mut self, slot: usize) {
        let Some(node) = self.slots[slot].take() else {
            return;
        };
        self.index.remove(&node.value);
        if let Some(parent_slot) = node.parent
            && let Some(parent) = &mut self.slots[parent_slot]
        {
            parent.children.retain(|child| *child != slot);
        }
        if self.root == Some(slot) {
            self.root = None;
        }
    }
}
