//! C3: Signal Instance Store.
//!
//! Owns one signal's instance pool and the `id_maps` array that reconciles
//! local instance slots with entries in the device-wide [`IdMapTable`]
//! (§3, §4.3). Mirrors the teacher crate's habit of keeping per-entity state
//! (`EndDevice<C>`) as a plain struct with explicit methods rather than
//! trait objects, generalized here to the signal/instance relationship.

use crate::clock::TimeTag;
use crate::idmap::{IdMapTable, IdMapToken};
use crate::instance::{IdMapEntry, IdMapEntryStatus, Instance};
use crate::value::{ElementType, Scalar};

/// Direction a signal flows relative to this device (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Static, rarely-changing signal metadata plus its live instance pool.
#[derive(Debug, Clone)]
pub struct Signal {
    pub name: String,
    pub path: String,
    pub element_type: ElementType,
    pub length: usize,
    pub direction: Direction,
    pub unit: Option<String>,
    pub min: Option<Scalar>,
    pub max: Option<Scalar>,
    id_maps: Vec<IdMapEntry>,
}

impl Signal {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        element_type: ElementType,
        length: usize,
        direction: Direction,
    ) -> Self {
        debug_assert!(length >= 1);
        Self {
            name: name.into(),
            path: path.into(),
            element_type,
            length,
            direction,
            unit: None,
            min: None,
            max: None,
            id_maps: Vec::new(),
        }
    }

    pub fn id_maps(&self) -> &[IdMapEntry] {
        &self.id_maps
    }

    /// Index of a free `id_maps` slot, pushing a new one if none is free.
    fn free_index(&mut self) -> usize {
        match self.id_maps.iter().position(|e| !e.is_bound()) {
            Some(i) => i,
            None => {
                self.id_maps.push(IdMapEntry::Free);
                self.id_maps.len() - 1
            }
        }
    }

    /// Find the `id_maps` index already bound to `token`, if any.
    fn index_for_token(&self, token: IdMapToken) -> Option<usize> {
        self.id_maps
            .iter()
            .position(|e| e.map_token() == Some(token))
    }

    /// Fetch-or-create the instance bound to the local instance id `local`,
    /// activating a fresh (local-only) id-map node when none exists yet
    /// (§4.3 "local updates never wait on a global id").
    pub fn get_with_local_id(&mut self, id_map_table: &mut IdMapTable, local: u32) -> usize {
        if let Some(token) = id_map_table.find_by_local(local) {
            if let Some(idx) = self.index_for_token(token) {
                return idx;
            }
        }

        let token = id_map_table.activate(local, 0);
        let idx = self.free_index();
        self.id_maps[idx] = IdMapEntry::Bound {
            map: token,
            instance: Instance::new(idx, self.length),
            status: IdMapEntryStatus::empty(),
        };
        idx
    }

    /// Fetch-or-create the instance bound to the network-wide id `global`.
    /// `local` seeds the id-map node's local half when a new one must be
    /// activated (§4.3, the remote-activation path of §4.4.2).
    pub fn get_with_global_id(
        &mut self,
        id_map_table: &mut IdMapTable,
        global: u64,
        local: u32,
    ) -> usize {
        if let Some(token) = id_map_table.find_by_global(global) {
            if let Some(idx) = self.index_for_token(token) {
                return idx;
            }
            let idx = self.free_index();
            self.id_maps[idx] = IdMapEntry::Bound {
                map: token,
                instance: Instance::new(idx, self.length),
                status: IdMapEntryStatus::empty(),
            };
            return idx;
        }

        let token = id_map_table.activate(local, global);
        // `activate` assumes a locally-initiated reference; this path is
        // reached when a remote message is the first thing to reference the
        // id, so the reference belongs to the remote side instead.
        if let Some(node) = id_map_table.get_mut(token) {
            node.refcount_local -= 1;
            node.refcount_global += 1;
        }
        let idx = self.free_index();
        self.id_maps[idx] = IdMapEntry::Bound {
            map: token,
            instance: Instance::new(idx, self.length),
            status: IdMapEntryStatus::empty(),
        };
        idx
    }

    /// Look up an existing instance by global id without creating one
    /// (§4.4.1 step 2: resolving `@instance` on an inbound message).
    pub fn find_with_global_id(&self, id_map_table: &IdMapTable, global: u64) -> Option<usize> {
        let token = id_map_table.find_by_global(global)?;
        self.index_for_token(token)
    }

    pub fn instance(&self, index: usize) -> Option<&Instance> {
        self.id_maps.get(index).and_then(IdMapEntry::instance)
    }

    pub fn instance_mut(&mut self, index: usize) -> Option<&mut Instance> {
        self.id_maps.get_mut(index).and_then(IdMapEntry::instance_mut)
    }

    /// Release the instance at `index` from this signal's side (§4.4.3
    /// release handling / §9's dual-refcount semantics).
    ///
    /// `locally` selects which half released: `true` for a local release
    /// (handler code let go of the instance), `false` for a remote release
    /// (a peer sent a release message). The underlying id-map node is only
    /// reclaimed, and the `id_maps` slot only freed, once both halves have
    /// released.
    pub fn release_internal(&mut self, id_map_table: &mut IdMapTable, index: usize, locally: bool) {
        let Some(entry) = self.id_maps.get_mut(index) else {
            return;
        };
        let (token, dead) = match entry {
            IdMapEntry::Bound { map, status, instance } => {
                if locally {
                    status.insert(IdMapEntryStatus::RELEASED_LOCALLY);
                } else {
                    status.insert(IdMapEntryStatus::RELEASED_REMOTELY);
                }
                instance.clear();

                let token = *map;
                let dead = match id_map_table.get_mut(token) {
                    Some(node) => {
                        if locally {
                            node.refcount_local -= 1;
                        } else {
                            node.refcount_global -= 1;
                        }
                        node.refcount_local <= 0 && node.refcount_global <= 0
                    }
                    None => true,
                };
                (token, dead)
            }
            IdMapEntry::Free => return,
        };

        if dead {
            id_map_table.remove(token);
            self.id_maps[index] = IdMapEntry::Free;
        }
    }

    pub fn apply_timetag(&mut self, index: usize, sample: &[Option<Scalar>], tt: TimeTag) {
        if let Some(instance) = self.instance_mut(index) {
            instance.apply_sample(sample, tt);
        }
    }
}
