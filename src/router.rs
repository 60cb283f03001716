//! C6: Router Interface Adapter.
//!
//! Tracks the maps currently bound to this device's signals. A map has one
//! destination slot and one or more source slots; a *convergent* map (more
//! than one source slot) only produces an update once every source slot
//! involved in that update has contributed a value (§4.4.3, §8 scenario 5).
//!
//! Mirrors the teacher's index-into-a-table style rather than an intrusive
//! linked structure, same as [`crate::idmap`].

use std::collections::HashMap;

use crate::value::Scalar;

/// One endpoint of a map: a signal path plus the optional slot index used
/// to disambiguate convergent sources (§4.1 `@slot` property).
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub signal_path: String,
    pub slot_index: Option<i32>,
    /// Most recent value contributed by this slot, consumed once the map
    /// fires (cleared to `None` afterward).
    pub pending: Option<Scalar>,
}

impl Slot {
    pub fn new(signal_path: impl Into<String>, slot_index: Option<i32>) -> Self {
        Self {
            signal_path: signal_path.into(),
            slot_index,
            pending: None,
        }
    }
}

/// A single active map between one or more source slots and a destination.
#[derive(Debug, Clone)]
pub struct Map {
    pub sources: Vec<Slot>,
    pub destination: Slot,
    /// Optional expression string carried opaquely; evaluating it is out of
    /// scope (an external collaborator concern), so the router only
    /// forwards the first source's value when no expression dictates
    /// otherwise.
    pub expression: Option<String>,
}

impl Map {
    pub fn is_convergent(&self) -> bool {
        self.sources.len() > 1
    }

    /// Record a value arriving on `signal_path`/`slot_index`. Returns the
    /// destination value once every source slot has contributed (for a
    /// non-convergent map, that's immediately); returns `None` while a
    /// convergent map is still waiting on other sources, per the partial-
    /// vector rejection rule of §8 scenario 5.
    fn feed(&mut self, signal_path: &str, slot_index: Option<i32>, value: Scalar) -> Option<Scalar> {
        let slot = self
            .sources
            .iter_mut()
            .find(|s| s.signal_path == signal_path && s.slot_index == slot_index)?;
        slot.pending = Some(value);

        if self.sources.iter().any(|s| s.pending.is_none()) {
            return None;
        }

        let out = self.expression_result();
        for s in &mut self.sources {
            s.pending = None;
        }
        out
    }

    fn expression_result(&self) -> Option<Scalar> {
        self.sources.first().and_then(|s| s.pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapId(u32);

/// Device-wide table of active maps, keyed by a monotonically-assigned id.
#[derive(Debug, Default)]
pub struct Router {
    maps: HashMap<MapId, Map>,
    next_id: u32,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_map(&mut self, sources: Vec<Slot>, destination: Slot, expression: Option<String>) -> MapId {
        let id = MapId(self.next_id);
        self.next_id += 1;
        self.maps.insert(
            id,
            Map {
                sources,
                destination,
                expression,
            },
        );
        id
    }

    pub fn remove_map(&mut self, id: MapId) -> Option<Map> {
        self.maps.remove(&id)
    }

    pub fn get(&self, id: MapId) -> Option<&Map> {
        self.maps.get(&id)
    }

    /// All maps with a source slot on `signal_path` (§4.4's routing-vs-
    /// handler dispatch rule: a signal with an active source map routes
    /// through the map instead of invoking its local update handler).
    pub fn maps_sourced_from<'a>(&'a self, signal_path: &'a str) -> impl Iterator<Item = (MapId, &'a Map)> {
        self.maps
            .iter()
            .filter(move |(_, m)| m.sources.iter().any(|s| s.signal_path == signal_path))
            .map(|(id, m)| (*id, m))
    }

    pub fn maps_targeting<'a>(&'a self, signal_path: &'a str) -> impl Iterator<Item = (MapId, &'a Map)> {
        self.maps
            .iter()
            .filter(move |(_, m)| m.destination.signal_path == signal_path)
            .map(|(id, m)| (*id, m))
    }

    /// Feed a value into every map sourced from `signal_path`, returning
    /// `(map id, destination slot, value)` for each map that completed.
    pub fn route(
        &mut self,
        signal_path: &str,
        slot_index: Option<i32>,
        value: Scalar,
    ) -> Vec<(MapId, Slot, Scalar)> {
        let mut fired = Vec::new();
        for (id, map) in self.maps.iter_mut() {
            if !map.sources.iter().any(|s| s.signal_path == signal_path) {
                continue;
            }
            if let Some(out) = map.feed(signal_path, slot_index, value) {
                fired.push((*id, map.destination.clone(), out));
            }
        }
        fired
    }

    /// True if any map currently sources from `signal_path` — the §4.4
    /// routing-vs-handler dispatch condition.
    pub fn has_source_map(&self, signal_path: &str) -> bool {
        self.maps_sourced_from(signal_path).next().is_some()
    }
}
