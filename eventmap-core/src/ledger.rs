//! Record of regions that have already been fetched.

use crate::bounds::Bounds;

/// Flat list of fetched rectangles.
///
/// Entries are never merged, so overlapping regions accumulate for the life of
/// the session. Only [`RegionLedger::reset`] shrinks it.
#[derive(Debug, Default, Clone)]
pub struct RegionLedger {
    entries: Vec<Bounds>,
}

impl RegionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// False iff some recorded rectangle fully contains `candidate`.
    pub fn needs_fetch(&self, candidate: &Bounds) -> bool {
        !self.entries.iter().any(|loaded| loaded.contains(candidate))
    }

    pub fn record(&mut self, region: Bounds) {
        self.entries.push(region);
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[Bounds] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
