//! C7: Device Lifecycle.
//!
//! Owns every other component: the signal table, the device-wide id-map,
//! and the router. `Device<C>` is generic over [`Clock`](crate::clock::Clock)
//! the same way the teacher's `EndDevice<C>` is — a caller with no clock
//! implementation in scope cannot name the type.

use std::collections::HashMap;

use crate::clock::{Clock, SystemClock};
use crate::error::DeviceError;
use crate::idmap::IdMapTable;
use crate::router::Router;
use crate::signal::Signal;

/// Tunable device behavior that doesn't belong on `Signal` or `Map`
/// individually.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub name: String,
    /// Multiplier applied to a signal's nominal update rate when deciding
    /// whether an inbound stream is exceeding its fair share of a poll
    /// cycle (§4.4's fairness cap). Exposed here rather than hardcoded so
    /// it can be tuned without recompiling.
    pub fairness_cap_multiplier: f64,
}

impl DeviceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fairness_cap_multiplier: 2.0,
        }
    }
}

/// High word of a not-yet-registered device's global ids: devices that
/// haven't received a network-assigned ordinal use this sentinel so their
/// locally-minted global ids are visibly distinct from any registered
/// device's (§9 Open Question 1).
const UNREGISTERED_HIGH_WORD: u32 = u32::MAX;

#[derive(Debug)]
pub struct Device<C: Clock = SystemClock> {
    pub config: DeviceConfig,
    clock: C,
    signals: HashMap<String, Signal>,
    id_map_table: IdMapTable,
    router: Router,
    registered: bool,
    local_counter: u32,
}

impl<C: Clock> Device<C> {
    pub fn new(config: DeviceConfig, clock: C) -> Result<Self, DeviceError> {
        if config.name.is_empty() {
            return Err(DeviceError::InvalidConfig("device name must not be empty".into()));
        }
        Ok(Self {
            config,
            clock,
            signals: HashMap::new(),
            id_map_table: IdMapTable::new(),
            router: Router::new(),
            registered: false,
            local_counter: 0,
        })
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn add_signal(&mut self, signal: Signal) -> Result<(), DeviceError> {
        if self.signals.contains_key(&signal.path) {
            return Err(DeviceError::DuplicateSignal(signal.path.clone()));
        }
        self.signals.insert(signal.path.clone(), signal);
        Ok(())
    }

    pub fn remove_signal(&mut self, path: &str) -> Option<Signal> {
        self.signals.remove(path)
    }

    pub fn signal(&self, path: &str) -> Option<&Signal> {
        self.signals.get(path)
    }

    pub fn signal_mut(&mut self, path: &str) -> Option<&mut Signal> {
        self.signals.get_mut(path)
    }

    /// Disjoint mutable access to one signal and the device-wide id-map
    /// table, so the id-map-mediated lookup methods on `Signal` can be
    /// called without the borrow checker treating `self` as a single
    /// borrowed unit.
    pub fn signal_and_table_mut(&mut self, path: &str) -> Option<(&mut Signal, &mut IdMapTable)> {
        let signal = self.signals.get_mut(path)?;
        Some((signal, &mut self.id_map_table))
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub fn id_map_table_mut(&mut self) -> &mut IdMapTable {
        &mut self.id_map_table
    }

    pub fn id_map_table_ref(&self) -> &IdMapTable {
        &self.id_map_table
    }

    /// Mint a 64-bit global id for a locally-originated instance before the
    /// device has been assigned a network ordinal: high word is the
    /// sentinel, low word an incrementing local counter.
    pub fn mint_local_global_id(&mut self) -> u64 {
        let low = self.local_counter;
        self.local_counter += 1;
        ((UNREGISTERED_HIGH_WORD as u64) << 32) | low as u64
    }

    /// Called once the admin subsystem (an external collaborator) assigns
    /// this device a network-wide ordinal. Rewrites only the high word of
    /// every id-map node's global id that was minted with the
    /// unregistered sentinel, leaving the low word — the original local
    /// counter value — untouched (§9 Open Question 1).
    pub fn mark_registered(&mut self, ordinal: u32) {
        let new_high = (ordinal as u64) << 32;
        for node in self.id_map_table.occupied_mut() {
            if node.global >> 32 == UNREGISTERED_HIGH_WORD as u64 {
                node.global = new_high | (node.global & 0xFFFF_FFFF);
            }
        }
        self.registered = true;
    }

    /// Ordered shutdown: release every active instance (both sides, so
    /// every id-map node is torn down deterministically) before dropping
    /// the signal table and router.
    pub fn teardown(mut self) {
        let paths: Vec<String> = self.signals.keys().cloned().collect();
        for path in paths {
            if let Some(signal) = self.signals.get_mut(&path) {
                let bound: Vec<usize> = signal
                    .id_maps()
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.is_bound())
                    .map(|(i, _)| i)
                    .collect();
                for idx in bound {
                    signal.release_internal(&mut self.id_map_table, idx, true);
                    signal.release_internal(&mut self.id_map_table, idx, false);
                }
            }
        }
        self.signals.clear();
    }
}
