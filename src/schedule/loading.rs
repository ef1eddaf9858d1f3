//! Capacity accounting against an object's open hours

use super::types::ScheduledItem;

/// Fill ratio and overflow computations for one window
///
/// Every item occupies its own length plus the inter-item delay; the last
/// item of the day needs no trailing delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadingCalculator {
    capacity_secs: i64,
    delay_secs: i64,
}

impl LoadingCalculator {
    pub fn new(capacity_secs: i64, delay_secs: i64) -> Self {
        Self {
            capacity_secs: capacity_secs.max(0),
            delay_secs: delay_secs.max(0),
        }
    }

    pub fn capacity_secs(&self) -> i64 {
        self.capacity_secs
    }

    /// Scheduled duration divided by open-hours duration
    pub fn get_loading(&self, items: &[ScheduledItem]) -> f64 {
        if self.capacity_secs == 0 {
            return 0.0;
        }
        total_secs(items) as f64 / self.capacity_secs as f64
    }

    /// True when scheduled content is longer than the open hours
    pub fn is_overloaded(&self, items: &[ScheduledItem]) -> bool {
        total_secs(items) > self.capacity_secs
    }

    /// Room an item of `length` takes on the timeline
    pub fn footprint(&self, length_secs: u32) -> i64 {
        i64::from(length_secs) + self.delay_secs
    }

    /// Most plays of one item the window allows when consecutive plays must
    /// be `min_gap_secs` apart (after the delay)
    pub fn max_repeats(&self, length_secs: u32, min_gap_secs: i64) -> u32 {
        let length = i64::from(length_secs);
        if length > self.capacity_secs {
            return 0;
        }
        let period = length + self.delay_secs + min_gap_secs.max(0);
        if period == 0 {
            return u32::MAX;
        }
        let repeats = (self.capacity_secs - length) / period + 1;
        u32::try_from(repeats).unwrap_or(u32::MAX)
    }

    /// Repeats of `advert_len` that cannot be added to `items`
    pub fn get_overflow_count(
        &self,
        items: &[ScheduledItem],
        advert_len: u32,
        requested: u32,
    ) -> u32 {
        let committed: i64 = items.iter().map(|i| self.footprint(i.length_secs)).sum();
        self.overflow_count_for(committed, advert_len, requested)
    }

    /// Same as [`get_overflow_count`](Self::get_overflow_count) for a raw
    /// committed footprint
    pub fn overflow_count_for(&self, committed_secs: i64, advert_len: u32, requested: u32) -> u32 {
        let footprint = self.footprint(advert_len);
        if footprint == 0 {
            return 0;
        }
        let free = (self.capacity_secs + self.delay_secs - committed_secs).max(0);
        let fits = free / footprint;
        if fits >= i64::from(requested) {
            0
        } else {
            requested - fits as u32
        }
    }
}

fn total_secs(items: &[ScheduledItem]) -> i64 {
    items.iter().map(|i| i64::from(i.length_secs)).sum()
}
