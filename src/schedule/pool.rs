//! Music candidate selection for one object
//!
//! Candidates are drawn in random order so a store does not open with the
//! same sequence every day. The random source is injected; tests and
//! reproducible runs use a seeded [`StdRng`].

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::catalog::{Catalog, MusicTrack, ObjectInfo};
use crate::error::{CatalogError, PoolError};

/// Ban-filtered music candidates for an object
pub async fn fetch_candidates(
    catalog: &dyn Catalog,
    object_id: i64,
) -> Result<Vec<MusicTrack>, CatalogError> {
    catalog.music_pool(object_id).await
}

/// Tracks drawn for a target duration, and the shuffled rest of the pool
#[derive(Debug, Clone, Default)]
pub struct TrackSelection {
    pub selected: Vec<MusicTrack>,
    pub reserve: Vec<MusicTrack>,
}

pub struct TrackPoolLoader<R = StdRng> {
    rng: R,
}

impl TrackPoolLoader<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> TrackPoolLoader<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Picks tracks whose combined length stays within `target_secs`
    ///
    /// Without a target the object's whole open-hours duration is used.
    /// A candidate longer than what is left is skipped and drawing goes on.
    pub fn select(
        &mut self,
        object: &ObjectInfo,
        candidates: Vec<MusicTrack>,
        target_secs: Option<u64>,
    ) -> Result<Vec<MusicTrack>, PoolError> {
        self.select_with_reserve(object, candidates, target_secs)
            .map(|selection| selection.selected)
    }

    /// Same as [`select`](Self::select), keeping the candidates that were
    /// not picked in their shuffled order
    pub fn select_with_reserve(
        &mut self,
        object: &ObjectInfo,
        mut candidates: Vec<MusicTrack>,
        target_secs: Option<u64>,
    ) -> Result<TrackSelection, PoolError> {
        let target = target_secs.unwrap_or_else(|| object.open_duration_secs().max(0) as u64);
        if candidates.is_empty() {
            if target == 0 {
                return Ok(TrackSelection::default());
            }
            return Err(PoolError::Empty {
                object_id: object.id,
            });
        }

        candidates.shuffle(&mut self.rng);

        let mut remaining = target;
        let mut selection = TrackSelection::default();
        for track in candidates {
            let length = u64::from(track.length_secs);
            if remaining > 0 && length <= remaining {
                remaining -= length;
                selection.selected.push(track);
            } else {
                selection.reserve.push(track);
            }
        }
        Ok(selection)
    }

    /// Fetches and selects in one step
    pub async fn load(
        &mut self,
        catalog: &dyn Catalog,
        object: &ObjectInfo,
        target_secs: Option<u64>,
    ) -> Result<Vec<MusicTrack>, PoolError> {
        let candidates = fetch_candidates(catalog, object.id).await?;
        self.select(object, candidates, target_secs)
    }
}
