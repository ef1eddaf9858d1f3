//! Catalog contract and the entities the generator reads through it
//!
//! Persistence of objects, adverts and music lives outside this crate. The
//! generator only sees the [`Catalog`] trait; [`InMemoryCatalog`] backs the
//! operator harness and the tests with a JSON fixture.

use crate::error::CatalogError;
use crate::schedule::types::ContentKind;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A retail location that plays scheduled audio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub id: i64,
    pub name: String,
    pub begin_time: NaiveTime,
    /// Closing time; earlier than `begin_time` means the window crosses midnight
    pub end_time: NaiveTime,
    #[serde(default)]
    pub free_days: Vec<Weekday>,
    #[serde(default = "default_volumes")]
    pub advert_volume: [u8; 24],
    #[serde(default = "default_volumes")]
    pub music_volume: [u8; 24],
    #[serde(default)]
    pub keep_on_top: bool,
    #[serde(default)]
    pub silent_time_secs: u32,
}

fn default_volumes() -> [u8; 24] {
    [100; 24]
}

impl ObjectInfo {
    pub fn is_free_day(&self, date: NaiveDate) -> bool {
        self.free_days.contains(&date.weekday())
    }

    /// Length of the operating window in seconds
    pub fn open_duration_secs(&self) -> i64 {
        let begin = i64::from(self.begin_time.num_seconds_from_midnight());
        let end = i64::from(self.end_time.num_seconds_from_midnight());
        if end >= begin {
            end - begin
        } else {
            end + 24 * 3600 - begin
        }
    }

    /// Volume for content of `kind` starting in `hour` (0-23)
    pub fn volume_at(&self, kind: ContentKind, hour: u32) -> u8 {
        let volumes = match kind {
            ContentKind::Advert => &self.advert_volume,
            ContentKind::Music => &self.music_volume,
        };
        volumes[(hour % 24) as usize]
    }
}

/// One campaign interval of an advert, both dates inclusive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertLifetime {
    pub date_begin: NaiveDate,
    pub date_end: NaiveDate,
    #[serde(default)]
    pub archived: bool,
}

impl AdvertLifetime {
    pub fn covers(&self, date: NaiveDate) -> bool {
        !self.archived && self.date_begin <= date && date <= self.date_end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advert {
    pub id: i64,
    pub name: String,
    pub length_secs: u32,
    pub lifetimes: Vec<AdvertLifetime>,
    #[serde(default = "default_true")]
    pub is_valid: bool,
    /// Requested plays per day, supplied by campaign configuration
    pub repeats_per_day: u32,
}

fn default_true() -> bool {
    true
}

impl Advert {
    /// Valid and covered by at least one non-archived lifetime
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.is_valid && self.lifetimes.iter().any(|l| l.covers(date))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicTrack {
    pub id: i64,
    pub name: String,
    pub length_secs: u32,
    #[serde(default)]
    pub genre: String,
}

/// Excludes a music track from one object's pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicBan {
    pub object_id: i64,
    pub track_id: i64,
}

/// Excludes an advert from one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertBan {
    pub object_id: i64,
    pub advert_id: i64,
}

/// Read-only access to objects, adverts and music
///
/// Every method is a suspension point of a generation run and may fail;
/// failures are fatal for that run.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Object descriptor
    async fn object(&self, object_id: i64) -> Result<ObjectInfo, CatalogError>;

    /// Adverts whose lifetime covers `date`, excluding archived, invalid and
    /// banned ones
    async fn valid_adverts(
        &self,
        object_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Advert>, CatalogError>;

    /// Music candidates for the object, banned tracks already removed
    async fn music_pool(&self, object_id: i64) -> Result<Vec<MusicTrack>, CatalogError>;
}

/// Whole catalog as stored in a JSON fixture
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub objects: Vec<ObjectInfo>,
    #[serde(default)]
    pub adverts: Vec<Advert>,
    #[serde(default)]
    pub tracks: Vec<MusicTrack>,
    #[serde(default)]
    pub music_bans: Vec<MusicBan>,
    #[serde(default)]
    pub advert_bans: Vec<AdvertBan>,
}

/// Catalog held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    data: CatalogData,
}

impl InMemoryCatalog {
    pub fn new(data: CatalogData) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &CatalogData {
        &self.data
    }

    fn banned_tracks(&self, object_id: i64) -> HashSet<i64> {
        self.data
            .music_bans
            .iter()
            .filter(|b| b.object_id == object_id)
            .map(|b| b.track_id)
            .collect()
    }

    fn banned_adverts(&self, object_id: i64) -> HashSet<i64> {
        self.data
            .advert_bans
            .iter()
            .filter(|b| b.object_id == object_id)
            .map(|b| b.advert_id)
            .collect()
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn object(&self, object_id: i64) -> Result<ObjectInfo, CatalogError> {
        self.data
            .objects
            .iter()
            .find(|o| o.id == object_id)
            .cloned()
            .ok_or(CatalogError::ObjectNotFound(object_id))
    }

    async fn valid_adverts(
        &self,
        object_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Advert>, CatalogError> {
        let banned = self.banned_adverts(object_id);
        Ok(self
            .data
            .adverts
            .iter()
            .filter(|a| a.is_active_on(date) && !banned.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn music_pool(&self, object_id: i64) -> Result<Vec<MusicTrack>, CatalogError> {
        let banned = self.banned_tracks(object_id);
        Ok(self
            .data
            .tracks
            .iter()
            .filter(|t| !banned.contains(&t.id))
            .cloned()
            .collect())
    }
}

/// Loads a catalog fixture from a JSON file
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<InMemoryCatalog, CatalogError> {
    let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        CatalogError::Unreachable(format!("{}: {}", path.as_ref().display(), e))
    })?;
    parse_catalog(&raw)
}

/// Parses a catalog fixture from JSON text
pub fn parse_catalog(raw: &str) -> Result<InMemoryCatalog, CatalogError> {
    let data: CatalogData =
        serde_json::from_str(raw).map_err(|e| CatalogError::Malformed(e.to_string()))?;
    Ok(InMemoryCatalog::new(data))
}
