//! C2: ID-Map Table.
//!
//! Reconciles local instance IDs with 64-bit network-wide instance IDs.
//! Each node carries two independent reference counts — §9's "dual
//! mutable... lifecycle" note calls out why: a peer releasing its side and
//! a local handler releasing its side are independent events, and a node
//! may only be recycled once both sides have let go.
//!
//! The teacher crate threads everything through plain indices into flat
//! arrays rather than pointers (`PhyPayload<T, S>` wrapping a byte slice,
//! `ChannelPlan` indexing into a table via `get_move`). Design Notes §9
//! directs the same move here: the C original's intrusive `next`-linked
//! free-list becomes a slab of stable [`IdMapToken`]s, dissolving the
//! device/signal/router reference cycle the original has to manage by hand.

/// A stable, reusable index into an [`IdMapTable`]. Recycled nodes get a new
/// token value (its slot index), so a stale token from a freed node simply
/// won't resolve to anything meaningful rather than aliasing live data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdMapToken(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdMapNode {
    pub local: u32,
    pub global: u64,
    pub refcount_local: i32,
    pub refcount_global: i32,
}

impl IdMapNode {
    fn is_dead(&self) -> bool {
        self.refcount_local <= 0 && self.refcount_global <= 0
    }
}

#[derive(Debug)]
enum Slot {
    Occupied(IdMapNode),
    Free { next: Option<u32> },
}

/// The device-wide table of ID-map nodes (§3 "one active ID-Map list, one
/// free-list of ID-Map nodes").
#[derive(Debug, Default)]
pub struct IdMapTable {
    slots: Vec<Slot>,
    free_head: Option<u32>,
}

impl IdMapTable {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
        }
    }

    /// Push a fresh free node onto the free-list, growing the backing store.
    pub fn reserve(&mut self) -> u32 {
        let idx = self.slots.len() as u32;
        self.slots.push(Slot::Free {
            next: self.free_head,
        });
        self.free_head = Some(idx);
        idx
    }

    /// Pop the free-list (reserving a new node if it is empty), bind
    /// `local`/`global`, and return the token. `refcount_local` starts at 1
    /// (the caller's own reference); `refcount_global` starts at 0.
    ///
    /// Per §4.2 it is undefined behavior to activate a `(local, global)`
    /// pair that already exists on the active list; the caller is
    /// responsible for checking via `find_by_local`/`find_by_global` first.
    pub fn activate(&mut self, local: u32, global: u64) -> IdMapToken {
        let idx = match self.free_head {
            Some(idx) => idx,
            None => self.reserve(),
        };
        let next = match &self.slots[idx as usize] {
            Slot::Free { next } => *next,
            Slot::Occupied(_) => unreachable!("free_head pointed at an occupied slot"),
        };
        self.free_head = next;
        self.slots[idx as usize] = Slot::Occupied(IdMapNode {
            local,
            global,
            refcount_local: 1,
            refcount_global: 0,
        });
        IdMapToken(idx)
    }

    pub fn get(&self, token: IdMapToken) -> Option<&IdMapNode> {
        match self.slots.get(token.0 as usize) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, token: IdMapToken) -> Option<&mut IdMapNode> {
        match self.slots.get_mut(token.0 as usize) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    /// Linear scan of the active ("occupied") entries, as specified.
    pub fn find_by_local(&self, local: u32) -> Option<IdMapToken> {
        self.slots.iter().enumerate().find_map(|(i, s)| match s {
            Slot::Occupied(node) if node.local == local => Some(IdMapToken(i as u32)),
            _ => None,
        })
    }

    pub fn find_by_global(&self, global: u64) -> Option<IdMapToken> {
        self.slots.iter().enumerate().find_map(|(i, s)| match s {
            Slot::Occupied(node) if node.global == global => Some(IdMapToken(i as u32)),
            _ => None,
        })
    }

    /// Unlink `token` from the active set and return it to the free-list.
    /// The caller must have already driven both refcounts to `<= 0`.
    pub fn remove(&mut self, token: IdMapToken) {
        let idx = token.0 as usize;
        debug_assert!(
            matches!(&self.slots[idx], Slot::Occupied(n) if n.is_dead()),
            "removed an id-map node with a live refcount"
        );
        self.slots[idx] = Slot::Free {
            next: self.free_head,
        };
        self.free_head = Some(token.0);
    }

    /// Mutable iterator over every active node, in arbitrary slot order.
    /// Used by device registration to rewrite global ids in bulk.
    pub fn occupied_mut(&mut self) -> impl Iterator<Item = &mut IdMapNode> {
        self.slots.iter_mut().filter_map(|s| match s {
            Slot::Occupied(node) => Some(node),
            Slot::Free { .. } => None,
        })
    }

    /// Number of currently-occupied (active) nodes. Exposed for invariant
    /// checks in tests, not part of the operational API.
    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Slot::Occupied(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activate_then_remove_recycles_slot() {
        let mut t = IdMapTable::new();
        let tok = t.activate(0, 0x1);
        assert_eq!(t.active_count(), 1);
        {
            let node = t.get_mut(tok).unwrap();
            node.refcount_local = 0;
        }
        t.remove(tok);
        assert_eq!(t.active_count(), 0);

        let tok2 = t.activate(1, 0x2);
        assert_eq!(t.active_count(), 1);
        assert_eq!(t.get(tok2).unwrap().local, 1);
    }

    #[test]
    fn find_by_global_scans_active_nodes() {
        let mut t = IdMapTable::new();
        let a = t.activate(0, 100);
        let b = t.activate(1, 200);
        assert_eq!(t.find_by_global(200), Some(b));
        assert_eq!(t.find_by_global(100), Some(a));
        assert_eq!(t.find_by_global(999), None);
    }

    #[test]
    fn refcounts_never_go_negative_in_normal_use() {
        let mut t = IdMapTable::new();
        let tok = t.activate(0, 1);
        let node = t.get(tok).unwrap();
        assert!(node.refcount_local >= 0);
        assert!(node.refcount_global >= 0);
    }
}
