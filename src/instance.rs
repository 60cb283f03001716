//! C3: Signal Instance Store — per-signal instance bookkeeping.

use crate::clock::TimeTag;
use crate::idmap::IdMapToken;
use crate::value::Scalar;
use bitflags::bitflags;

bitflags! {
    /// Per-id-map-index status (§3 "ID-Map index status bitflags").
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IdMapEntryStatus: u8 {
        const RELEASED_LOCALLY = 0b01;
        const RELEASED_REMOTELY = 0b10;
    }
}

/// One concurrent voice/value within a signal (§3 "Signal Instance").
#[derive(Debug, Clone)]
pub struct Instance {
    pub index: usize,
    /// One slot per vector element; `None` means "no value received yet for
    /// this element," the idiomatic stand-in for the C original's packed
    /// `has_value_flags` bitmap plus separate value buffer.
    value: Vec<Option<Scalar>>,
    pub timetag: TimeTag,
}

impl Instance {
    pub fn new(index: usize, length: usize) -> Self {
        Self {
            index,
            value: vec![None; length],
            timetag: TimeTag::ZERO,
        }
    }

    pub fn length(&self) -> usize {
        self.value.len()
    }

    pub fn values(&self) -> &[Option<Scalar>] {
        &self.value
    }

    /// True once every element has received a value (`has_value_flags` is
    /// the all-ones template, per §3's invariant).
    pub fn has_value(&self) -> bool {
        self.value.iter().all(Option::is_some)
    }

    /// Write the non-null elements of `sample` into this instance, setting
    /// their has-value bit, and stamp `tt`. Matches the "plain update" /
    /// "full update via map" element-copy step of §4.4.3.
    pub fn apply_sample(&mut self, sample: &[Option<Scalar>], tt: TimeTag) {
        debug_assert_eq!(sample.len(), self.value.len());
        for (slot, v) in self.value.iter_mut().zip(sample.iter()) {
            if let Some(v) = v {
                *slot = Some(*v);
            }
        }
        self.timetag = tt;
    }

    /// Reset to the "no value" state, as happens when an instance is
    /// released (§4.4.3 release sub-case leaves the value cleared so a
    /// subsequent reactivation starts fresh).
    pub fn clear(&mut self) {
        for slot in self.value.iter_mut() {
            *slot = None;
        }
    }
}

/// One entry in a signal's `id_maps` array (§3 Signal invariant: "every
/// id_maps entry either holds `{map, instance, status}` or is free").
#[derive(Debug, Clone)]
pub enum IdMapEntry {
    Free,
    Bound {
        map: IdMapToken,
        instance: Instance,
        status: IdMapEntryStatus,
    },
}

impl IdMapEntry {
    pub fn is_bound(&self) -> bool {
        matches!(self, IdMapEntry::Bound { .. })
    }

    pub fn instance(&self) -> Option<&Instance> {
        match self {
            IdMapEntry::Bound { instance, .. } => Some(instance),
            IdMapEntry::Free => None,
        }
    }

    pub fn instance_mut(&mut self) -> Option<&mut Instance> {
        match self {
            IdMapEntry::Bound { instance, .. } => Some(instance),
            IdMapEntry::Free => None,
        }
    }

    pub fn map_token(&self) -> Option<IdMapToken> {
        match self {
            IdMapEntry::Bound { map, .. } => Some(*map),
            IdMapEntry::Free => None,
        }
    }

    pub fn status(&self) -> IdMapEntryStatus {
        match self {
            IdMapEntry::Bound { status, .. } => *status,
            IdMapEntry::Free => IdMapEntryStatus::empty(),
        }
    }
}
