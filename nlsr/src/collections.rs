//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, HashMap};

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::Error;
use crate::lsdb::LsaEntry;
use crate::packet::LsaKey;
use crate::packet::consts::LsaType;
use crate::packet::lsa::Lsa;
use crate::tasks::messages::input::LsaExpiryMsg;

pub type ObjectId = u32;

#[derive(Clone, Debug)]
#[derive(Deserialize, Serialize)]
pub enum ObjectKey<T> {
    Id(ObjectId),
    Value(T),
}

pub type LsaEntryId = ObjectId;
pub type LsaEntryIndex = Index;
pub type LsaEntryKey = ObjectKey<LsaKey>;

#[derive(Debug)]
pub struct Arena<T>(generational_arena::Arena<T>);

#[derive(Debug, Default)]
pub struct Lsdb {
    id_tree: HashMap<ObjectId, LsaEntryIndex>,
    key_tree: BTreeMap<LsaKey, LsaEntryIndex>,
    next_id: ObjectId,
}

// ===== impl ObjectKey =====

impl<T> From<ObjectId> for ObjectKey<T> {
    fn from(id: ObjectId) -> ObjectKey<T> {
        ObjectKey::Id(id)
    }
}

// ===== impl Arena =====

impl<T> Default for Arena<T> {
    fn default() -> Arena<T> {
        Arena(Default::default())
    }
}

impl<T> std::ops::Index<Index> for Arena<T> {
    type Output = T;

    fn index(&self, index: Index) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> std::ops::IndexMut<Index> for Arena<T> {
    fn index_mut(&mut self, index: Index) -> &mut Self::Output {
        &mut self.0[index]
    }
}

// ===== impl Lsdb =====

impl Lsdb {
    pub(crate) fn insert<'a>(
        &mut self,
        arena: &'a mut Arena<LsaEntry>,
        lsa: Lsa,
        lsa_expiryp: &UnboundedSender<LsaExpiryMsg>,
    ) -> (LsaEntryIndex, &'a mut LsaEntry) {
        // Create and insert LSA entry into the arena.
        self.next_id += 1;
        let lse = LsaEntry::new(self.next_id, lsa, lsa_expiryp);
        let lse_idx = arena.0.insert(lse);

        // Link LSA entry to different collections.
        let lse = &mut arena[lse_idx];
        self.id_tree.insert(lse.id, lse_idx);
        self.key_tree.insert(lse.data.key(), lse_idx);

        (lse_idx, lse)
    }

    pub(crate) fn delete(
        &mut self,
        arena: &mut Arena<LsaEntry>,
        lse_idx: LsaEntryIndex,
    ) -> LsaEntry {
        let lse = &mut arena[lse_idx];

        // Unlink LSA entry from different collections.
        self.id_tree.remove(&lse.id);
        self.key_tree.remove(&lse.data.key());

        // Remove LSA entry from the arena.
        arena.0.remove(lse_idx).unwrap()
    }

    // Returns a reference to the LSA entry corresponding to the given ID.
    pub(crate) fn get_by_id<'a>(
        &self,
        arena: &'a Arena<LsaEntry>,
        id: ObjectId,
    ) -> Result<(LsaEntryIndex, &'a LsaEntry), Error> {
        self.id_tree
            .get(&id)
            .copied()
            .map(|lse_idx| (lse_idx, &arena[lse_idx]))
            .filter(|(_, lse)| lse.id == id)
            .ok_or(Error::LsaEntryIdNotFound(id))
    }

    // Returns a reference to the LSA entry corresponding to the given
    // (origin, type) pair.
    pub fn get<'a>(
        &self,
        arena: &'a Arena<LsaEntry>,
        key: &LsaKey,
    ) -> Option<(LsaEntryIndex, &'a LsaEntry)> {
        self.key_tree
            .get(key)
            .copied()
            .map(|lse_idx| (lse_idx, &arena[lse_idx]))
    }

    // Returns a mutable reference to the LSA entry corresponding to the given
    // (origin, type) pair.
    pub(crate) fn get_mut<'a>(
        &mut self,
        arena: &'a mut Arena<LsaEntry>,
        key: &LsaKey,
    ) -> Option<(LsaEntryIndex, &'a mut LsaEntry)> {
        self.key_tree
            .get(key)
            .copied()
            .map(move |lse_idx| (lse_idx, &mut arena[lse_idx]))
    }

    // Returns a reference to the LSA entry corresponding to the given object
    // key.
    pub(crate) fn get_by_key<'a>(
        &self,
        arena: &'a Arena<LsaEntry>,
        key: &LsaEntryKey,
    ) -> Result<(LsaEntryIndex, &'a LsaEntry), Error> {
        match key {
            LsaEntryKey::Id(id) => self.get_by_id(arena, *id),
            LsaEntryKey::Value(lsa_key) => self
                .get(arena, lsa_key)
                .ok_or_else(|| Error::LsaEntryNotFound(lsa_key.clone())),
        }
    }

    // Returns an iterator visiting all LSA entries.
    //
    // LSAs are ordered by (origin router, type).
    pub fn iter<'a>(
        &'a self,
        arena: &'a Arena<LsaEntry>,
    ) -> impl Iterator<Item = &'a LsaEntry> + 'a {
        self.key_tree.values().map(|lse_idx| &arena[*lse_idx])
    }

    // Returns an iterator visiting all LSA entries of the given type.
    pub fn iter_for_type<'a>(
        &'a self,
        arena: &'a Arena<LsaEntry>,
        lsa_type: LsaType,
    ) -> impl Iterator<Item = &'a LsaEntry> + 'a {
        self.iter(arena)
            .filter(move |lse| lse.data.lsa_type() == lsa_type)
    }
}
