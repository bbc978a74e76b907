use win_winops::{Placement, WindowId};

use crate::MonitorRange;

/// Cached state for one window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacementRecord {
    id: WindowId,
    /// Class name at the last save; a different class under the same handle
    /// means the handle was recycled.
    class_name: String,
    /// Lowest monitor count, i.e. the count stored in `slots[0]`.
    base: u32,
    /// One snapshot per monitor count; `None` until first saved.
    slots: Vec<Option<Placement>>,
    /// Consecutive scans in which the window was not observed.
    miss_count: u32,
}

impl PlacementRecord {
    /// Empty record with one slot per count in `range`.
    pub(crate) fn new(id: WindowId, range: &MonitorRange) -> Self {
        Self {
            id,
            class_name: String::new(),
            base: range.min,
            slots: vec![None; range.len()],
            miss_count: 0,
        }
    }

    /// Window handle.
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// Class name recorded at the last save.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Consecutive scans the window was not seen in.
    pub fn miss_count(&self) -> u32 {
        self.miss_count
    }

    /// Snapshot saved for `monitors`, if that count is tracked and was saved.
    pub fn slot(&self, monitors: u32) -> Option<&Placement> {
        let idx = monitors.checked_sub(self.base)? as usize;
        self.slots.get(idx)?.as_ref()
    }

    /// Monitor counts that have a saved snapshot.
    pub fn saved_counts(&self) -> impl Iterator<Item = u32> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| self.base + i as u32)
    }

    /// The window was seen in the current scan.
    pub(crate) fn observe(&mut self, class_name: Option<String>) {
        self.miss_count = 0;
        if let Some(c) = class_name {
            self.class_name = c;
        }
    }

    /// Overwrite the snapshot at slot `idx`.
    pub(crate) fn store(&mut self, idx: usize, placement: Placement) {
        if let Some(slot) = self.slots.get_mut(idx) {
            *slot = Some(placement);
        }
    }

    /// Count one missed scan and return the new miss count.
    pub(crate) fn mark_missed(&mut self) -> u32 {
        self.miss_count = self.miss_count.saturating_add(1);
        self.miss_count
    }

    /// Whether the window is considered currently present.
    pub(crate) fn is_present(&self, stale_threshold: u32) -> bool {
        self.miss_count <= stale_threshold
    }
}

#[cfg(test)]
mod tests {
    use win_winops::{Placement, Rect, ShowState};

    use super::PlacementRecord;
    use crate::MonitorRange;

    fn p(x: i32) -> Placement {
        Placement {
            normal: Rect::from_xywh(x, 0, 10, 10),
            show: ShowState::Normal,
        }
    }

    #[test]
    fn slots_are_indexed_by_monitor_count() {
        let range = MonitorRange::default();
        let mut rec = PlacementRecord::new(7, &range);
        rec.store(range.slot(3).unwrap(), p(3));
        assert_eq!(rec.slot(3), Some(&p(3)));
        assert_eq!(rec.slot(2), None);
        assert_eq!(rec.slot(1), None);
        assert_eq!(rec.slot(9), None);
        assert_eq!(rec.saved_counts().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn observe_resets_misses_and_keeps_class_on_failed_read() {
        let mut rec = PlacementRecord::new(7, &MonitorRange::default());
        rec.observe(Some("Alpha".into()));
        assert_eq!(rec.mark_missed(), 1);
        assert_eq!(rec.mark_missed(), 2);
        assert!(rec.is_present(2));
        assert_eq!(rec.mark_missed(), 3);
        assert!(!rec.is_present(2));
        rec.observe(None);
        assert_eq!(rec.miss_count(), 0);
        assert_eq!(rec.class_name(), "Alpha");
    }
}
