//! placekeeper-store: the window placement cache.
//!
//! A [`PlacementStore`] maps window handles to [`PlacementRecord`]s. Each
//! record keeps one placement snapshot per supported monitor count, so a
//! window can be put back where it was the last time the same number of
//! monitors was attached.
//!
//! There is no notification when a window is destroyed. Instead the owner
//! calls [`PlacementStore::sweep`] at the start of every full scan and then
//! [`PlacementStore::save`] for every window it sees; records that keep
//! missing scans are first treated as absent (stale) and eventually evicted.

mod record;
mod store;

pub use record::PlacementRecord;
pub use store::PlacementStore;

/// Records missing more than this many consecutive scans are not restored.
pub const STALE_THRESHOLD: u32 = 2;

/// Records are evicted when their miss count reaches this value.
pub const EVICTION_THRESHOLD: u32 = 100;

/// Fewest monitors for which placements are tracked.
pub const MIN_MONITORS: u32 = 2;

/// Most monitors for which placements are tracked.
pub const MAX_MONITORS: u32 = 5;

/// Inclusive range of monitor counts that get a placement slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonitorRange {
    /// Lowest tracked count.
    pub min: u32,
    /// Highest tracked count.
    pub max: u32,
}

impl Default for MonitorRange {
    fn default() -> Self {
        Self {
            min: MIN_MONITORS,
            max: MAX_MONITORS,
        }
    }
}

impl MonitorRange {
    /// Whether `n` monitors has a slot.
    pub fn contains(&self, n: u32) -> bool {
        self.min <= n && n <= self.max
    }

    /// Slot index for `n` monitors.
    pub fn slot(&self, n: u32) -> Option<usize> {
        self.contains(n).then(|| (n - self.min) as usize)
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        if self.max < self.min {
            0
        } else {
            (self.max - self.min + 1) as usize
        }
    }

    /// True if the range tracks nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Configuration for the placement cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreCfg {
    /// Monitor counts that get a slot.
    pub monitors: MonitorRange,
    /// A record is restorable while `miss_count <= stale_threshold`.
    pub stale_threshold: u32,
    /// A record is evicted when `miss_count` reaches this value.
    pub eviction_threshold: u32,
}

impl Default for StoreCfg {
    fn default() -> Self {
        Self {
            monitors: MonitorRange::default(),
            stale_threshold: STALE_THRESHOLD,
            eviction_threshold: EVICTION_THRESHOLD,
        }
    }
}
