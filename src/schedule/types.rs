use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// What kind of content an item plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Music,
    Advert,
}

/// Identity used for repeat-gap checks; advert and track ids are separate spaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentKey {
    pub kind: ContentKind,
    pub id: i64,
}

impl ContentKey {
    pub fn advert(id: i64) -> Self {
        Self {
            kind: ContentKind::Advert,
            id,
        }
    }

    pub fn music(id: i64) -> Self {
        Self {
            kind: ContentKind::Music,
            id,
        }
    }
}

/// One entry of a generated playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledItem {
    pub content_id: i64,
    pub kind: ContentKind,
    pub start: NaiveDateTime,
    pub length_secs: u32,
    pub volume: u8,
}

impl ScheduledItem {
    pub fn key(&self) -> ContentKey {
        ContentKey {
            kind: self.kind,
            id: self.content_id,
        }
    }

    pub fn end(&self) -> NaiveDateTime {
        self.start + chrono::Duration::seconds(i64::from(self.length_secs))
    }
}

/// Playlist for a single object and date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub object_id: i64,
    pub date: NaiveDate,
    pub items: Vec<ScheduledItem>, // ordered by start
    pub overloaded: bool,
}

impl Playlist {
    pub fn total_secs(&self) -> i64 {
        self.items.iter().map(|i| i64::from(i.length_secs)).sum()
    }

    pub fn count_of(&self, kind: ContentKind) -> usize {
        self.items.iter().filter(|i| i.kind == kind).count()
    }
}

/// Why advert repeats were left out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotFittedReason {
    /// Open hours cannot hold the requested load
    Capacity,
    /// More repeats than the same-content gap allows in one window
    Spacing,
    /// Admitted, but no legal slot was left before closing
    Placement,
}

/// Advert repeats that did not make it into the playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotFittedAdvert {
    pub advert_id: i64,
    pub length_secs: u32,
    pub count: u32,
    pub reason: NotFittedReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistGeneratorStatus {
    Generated,
    NotGenerated,
    /// The date is not an operating day; any stored playlist should be retracted
    Delete,
}

/// Outcome of one generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistGeneratorResult {
    pub status: PlaylistGeneratorStatus,
    pub playlist: Option<Playlist>,
    pub not_fitted: Vec<NotFittedAdvert>,
    pub debug_info: Vec<String>,
}

impl PlaylistGeneratorResult {
    /// Total advert repeats that were dropped, whatever the reason
    pub fn not_fitted_count(&self) -> u32 {
        self.not_fitted.iter().map(|n| n.count).sum()
    }
}
