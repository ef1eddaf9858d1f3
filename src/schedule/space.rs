//! Timeline of one generation run
//!
//! Offsets are seconds from the opening of the window. Items are appended at
//! a cursor; every placement is checked against the window end, the maximum
//! advert run and the minimum gap between two plays of the same content.

use std::collections::HashMap;
use std::fmt;

use super::types::{ContentKey, ContentKind};
use crate::config::GeneratorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    Free,
    Occupied,
}

/// Contiguous span `[from, to)` of the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub from: i64,
    pub to: i64,
    pub state: SegmentState,
}

/// An item committed to the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub key: ContentKey,
    pub start: i64,
    pub length: i64,
}

impl Placement {
    pub fn end(&self) -> i64 {
        self.start + self.length
    }
}

/// Why an item cannot go at the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Would end after the window closes
    WindowEnd,
    /// Would make the run of consecutive adverts too long
    AdvertSequence,
    /// The same content played too recently
    SameContentGap,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::WindowEnd => write!(f, "past closing time"),
            Rejection::AdvertSequence => write!(f, "advert run limit reached"),
            Rejection::SameContentGap => write!(f, "same content played too recently"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpaceManager {
    window_end: i64,
    cursor: i64,
    placements: Vec<Placement>,
    last_end: HashMap<ContentKey, i64>,
    advert_run: u32,
    max_advert_sequence: u32,
    min_gap: i64,
    delay: i64,
    sequence_break: i64,
}

impl SpaceManager {
    /// Empty timeline covering `[0, window_length)`
    ///
    /// `config` is expected to be validated already.
    pub fn new(window_length: i64, config: &GeneratorConfig) -> Self {
        Self {
            window_end: window_length.max(0),
            cursor: 0,
            placements: Vec::new(),
            last_end: HashMap::new(),
            advert_run: 0,
            max_advert_sequence: config.max_advert_sequence,
            min_gap: config.min_same_track_gap_secs,
            delay: config.delay_between_tracks_secs,
            sequence_break: config.sequence_break_secs,
        }
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn window_end(&self) -> i64 {
        self.window_end
    }

    pub fn into_placements(self) -> Vec<Placement> {
        self.placements
    }

    /// Adverts played back to back up to the cursor
    pub fn advert_run(&self) -> u32 {
        self.run_before(self.cursor)
    }

    /// Time left between the cursor and closing
    pub fn remaining_capacity(&self) -> i64 {
        (self.window_end - self.cursor).max(0)
    }

    /// Length of the advert run an item starting at `start` would follow
    fn run_before(&self, start: i64) -> u32 {
        match self.placements.last() {
            Some(prev)
                if prev.key.kind == ContentKind::Advert
                    && start - prev.end() < self.delay + self.sequence_break =>
            {
                self.advert_run
            }
            _ => 0,
        }
    }

    fn check(&self, key: ContentKey, length: i64, start: i64) -> Result<(), Rejection> {
        if start + length > self.window_end {
            return Err(Rejection::WindowEnd);
        }
        if let Some(&prev_end) = self.last_end.get(&key) {
            if start < prev_end + self.delay + self.min_gap {
                return Err(Rejection::SameContentGap);
            }
        }
        if key.kind == ContentKind::Advert && self.run_before(start) >= self.max_advert_sequence {
            return Err(Rejection::AdvertSequence);
        }
        Ok(())
    }

    /// Start the item would get if appended now, without committing it
    pub fn can_place(&self, key: ContentKey, length: i64) -> Result<i64, Rejection> {
        self.check(key, length, self.cursor).map(|_| self.cursor)
    }

    /// Appends the item at the cursor
    ///
    /// On success the cursor moves past the item and the inter-item delay.
    pub fn try_place(&mut self, key: ContentKey, length: i64) -> Result<i64, Rejection> {
        let start = self.cursor;
        self.check(key, length, start)?;

        self.advert_run = match key.kind {
            ContentKind::Advert => self.run_before(start) + 1,
            ContentKind::Music => 0,
        };
        self.placements.push(Placement { key, start, length });
        self.last_end.insert(key, start + length);
        self.cursor = start + length + self.delay;
        Ok(start)
    }

    /// First offset at or after the cursor where the item would be legal
    ///
    /// `None` when it can no longer fit before closing.
    pub fn earliest_start(&self, key: ContentKey, length: i64) -> Option<i64> {
        let mut start = self.cursor;

        if key.kind == ContentKind::Advert && self.run_before(start) >= self.max_advert_sequence {
            if let Some(prev) = self.placements.last() {
                start = start.max(prev.end() + self.delay + self.sequence_break);
            }
        }
        if let Some(&prev_end) = self.last_end.get(&key) {
            start = start.max(prev_end + self.delay + self.min_gap);
        }

        if start + length > self.window_end {
            None
        } else {
            Some(start)
        }
    }

    /// Leaves the timeline free up to `offset`
    pub fn idle_until(&mut self, offset: i64) {
        if offset > self.cursor {
            self.cursor = offset;
        }
    }

    /// Free/occupied partition of the whole window
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments: Vec<Segment> = Vec::new();
        let mut at = 0;

        for placement in &self.placements {
            if placement.start > at {
                push_free(&mut segments, at, placement.start);
            }
            if placement.length > 0 {
                segments.push(Segment {
                    from: placement.start,
                    to: placement.end(),
                    state: SegmentState::Occupied,
                });
            }
            at = placement.end();
        }
        if at < self.window_end {
            push_free(&mut segments, at, self.window_end);
        }
        segments
    }
}

fn push_free(segments: &mut Vec<Segment>, from: i64, to: i64) {
    if let Some(last) = segments.last_mut() {
        if last.state == SegmentState::Free && last.to == from {
            last.to = to;
            return;
        }
    }
    segments.push(Segment {
        from,
        to,
        state: SegmentState::Free,
    });
}
