//! Playlist generation for one object and date
//!
//! A run fetches everything it needs from the catalog up front, then builds
//! the playlist without further I/O:
//!
//! 1. free days and zero-length windows give [`PlaylistGeneratorStatus::Delete`]
//! 2. adverts are admitted as far as the repeat gap and open-hours capacity
//!    allow
//! 3. admitted repeats get evenly spread target times
//! 4. the timeline is swept from opening to closing: a due advert goes first
//!    while the advert run limit allows, otherwise the next selected music
//!    track, otherwise a track from the rest of the pool, otherwise the
//!    timeline idles until something becomes placeable
//! 5. repeats still waiting at closing time are reported as not fitted

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::loading::LoadingCalculator;
use super::pool::{fetch_candidates, TrackPoolLoader, TrackSelection};
use super::slot_utils::{compute_window, secs_to_time_string, Window};
use super::space::{Rejection, SegmentState, SpaceManager};
use super::spacing::{spread_repeats, RepeatTarget};
use super::types::{
    ContentKey, NotFittedAdvert, NotFittedReason, Playlist, PlaylistGeneratorResult,
    PlaylistGeneratorStatus, ScheduledItem,
};
use crate::catalog::{Advert, Catalog, MusicTrack, ObjectInfo};
use crate::config::GeneratorConfig;
use crate::error::{CatalogError, GeneratorError, Result};

/// Human-readable trace of a run, mirrored to `tracing`
#[derive(Debug, Default)]
struct DebugLog {
    lines: Vec<String>,
}

impl DebugLog {
    fn push(&mut self, line: String) {
        debug!("{}", line);
        self.lines.push(line);
    }
}

pub struct PlaylistGenerator {
    catalog: Arc<dyn Catalog>,
    config: GeneratorConfig,
}

impl PlaylistGenerator {
    pub fn new(catalog: Arc<dyn Catalog>, config: GeneratorConfig) -> Self {
        Self { catalog, config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates the playlist of `object_id` for `date`
    pub async fn generate(
        &self,
        object_id: i64,
        date: NaiveDate,
    ) -> Result<PlaylistGeneratorResult> {
        self.generate_with_cancel(object_id, date, &CancellationToken::new())
            .await
    }

    /// Same as [`generate`](Self::generate), aborting with
    /// [`GeneratorError::Cancelled`] once `cancel` fires
    pub async fn generate_with_cancel(
        &self,
        object_id: i64,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<PlaylistGeneratorResult> {
        self.config.validate()?;

        let object = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GeneratorError::Cancelled),
            object = self.query(self.catalog.object(object_id)) => object?,
        };

        if let Some(result) = retraction(&object, date, DebugLog::default()) {
            return Ok(result);
        }

        let (adverts, candidates) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GeneratorError::Cancelled),
            fetched = async {
                tokio::try_join!(
                    self.query(self.catalog.valid_adverts(object_id, date)),
                    self.query(fetch_candidates(self.catalog.as_ref(), object_id)),
                )
            } => fetched?,
        };

        if cancel.is_cancelled() {
            return Err(GeneratorError::Cancelled);
        }
        self.plan(&object, date, adverts, candidates)
    }

    /// Generates consecutive dates, stopping at the first fatal error
    pub async fn generate_range(
        &self,
        object_id: i64,
        first_date: NaiveDate,
        days: u32,
    ) -> Result<Vec<(NaiveDate, PlaylistGeneratorResult)>> {
        let mut results = Vec::with_capacity(days as usize);
        let mut date = first_date;
        for _ in 0..days {
            results.push((date, self.generate(object_id, date).await?));
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        Ok(results)
    }

    /// Builds a playlist from inputs that were already fetched
    ///
    /// Pure apart from the music shuffle, which is reproducible when a seed
    /// is configured.
    pub fn plan(
        &self,
        object: &ObjectInfo,
        date: NaiveDate,
        adverts: Vec<Advert>,
        candidates: Vec<MusicTrack>,
    ) -> Result<PlaylistGeneratorResult> {
        self.config.validate()?;

        if let Some(result) = retraction(object, date, DebugLog::default()) {
            return Ok(result);
        }
        let Some(window) = compute_window(object, date) else {
            return Ok(delete_result(Vec::new()));
        };

        Ok(self.build(object, date, window, adverts, candidates))
    }

    async fn query<T, F>(&self, query: F) -> std::result::Result<T, CatalogError>
    where
        F: Future<Output = std::result::Result<T, CatalogError>>,
    {
        let timeout = self.config.query_timeout();
        match tokio::time::timeout(timeout, query).await {
            Ok(result) => result,
            Err(_) => Err(CatalogError::Timeout(timeout)),
        }
    }

    fn pool_loader(&self, object: &ObjectInfo, date: NaiveDate) -> TrackPoolLoader {
        match self.config.seed {
            Some(seed) => TrackPoolLoader::seeded(run_seed(seed, object.id, date)),
            None => TrackPoolLoader::from_entropy(),
        }
    }

    fn build(
        &self,
        object: &ObjectInfo,
        date: NaiveDate,
        window: Window,
        adverts: Vec<Advert>,
        candidates: Vec<MusicTrack>,
    ) -> PlaylistGeneratorResult {
        let mut log = DebugLog::default();
        let window_len = window.length_secs();
        let calc = LoadingCalculator::new(window_len, self.config.delay_between_tracks_secs);
        let mut not_fitted = Vec::new();

        log.push(format!(
            "object {} on {}: window {} - {} ({} s)",
            object.id, date, window.start, window.end, window_len
        ));

        // Admission
        let mut adverts: Vec<Advert> = adverts
            .into_iter()
            .filter(|advert| {
                let active = advert.is_active_on(date);
                if !active {
                    log.push(format!(
                        "advert {} skipped: not valid on {}",
                        advert.id, date
                    ));
                }
                active
            })
            .collect();
        adverts.sort_by_key(|advert| advert.id);

        let mut committed = 0i64;
        let mut admitted = Vec::with_capacity(adverts.len());
        for advert in &adverts {
            let requested = advert.repeats_per_day;
            let spaced = requested.min(
                calc.max_repeats(advert.length_secs, self.config.min_same_track_gap_secs),
            );
            if spaced < requested {
                log.push(format!(
                    "advert {} ({} s): {} of {} repeats exceed what the repeat gap allows",
                    advert.id,
                    advert.length_secs,
                    requested - spaced,
                    requested
                ));
                not_fitted.push(NotFittedAdvert {
                    advert_id: advert.id,
                    length_secs: advert.length_secs,
                    count: requested - spaced,
                    reason: NotFittedReason::Spacing,
                });
            }

            let dropped = calc.overflow_count_for(committed, advert.length_secs, spaced);
            let fit = spaced - dropped;
            committed += i64::from(fit) * calc.footprint(advert.length_secs);

            if dropped > 0 {
                log.push(format!(
                    "advert {} ({} s): {} of {} repeats exceed open-hours capacity",
                    advert.id, advert.length_secs, dropped, spaced
                ));
                not_fitted.push(NotFittedAdvert {
                    advert_id: advert.id,
                    length_secs: advert.length_secs,
                    count: dropped,
                    reason: NotFittedReason::Capacity,
                });
            }
            log.push(format!(
                "advert {} ({} s): admitted {} of {} repeats",
                advert.id, advert.length_secs, fit, requested
            ));
            admitted.push(fit);
        }

        // Music, with the rest of the pool kept for time adverts leave unused
        let music_target = (window_len - committed).max(0) as u64;
        let selection = match self
            .pool_loader(object, date)
            .select_with_reserve(object, candidates, Some(music_target))
        {
            Ok(selection) => {
                log.push(format!(
                    "music: {} tracks selected for {} s of free time, {} in reserve",
                    selection.selected.len(),
                    music_target,
                    selection.reserve.len()
                ));
                selection
            }
            Err(e) => {
                warn!("object {} on {}: {}", object.id, date, e);
                log.push(format!("music: {}", e));
                TrackSelection::default()
            }
        };

        // Sweep
        let mut space = SpaceManager::new(window_len, &self.config);
        let mut pending = spread_repeats(window_len, &admitted);
        let mut music: VecDeque<MusicTrack> = selection.selected.into();
        let mut reserve: VecDeque<MusicTrack> = selection.reserve.into();
        let mut topped_up = 0usize;
        let mut last_rejection: HashMap<usize, Rejection> = HashMap::new();

        while space.cursor() < window_len {
            if place_due_advert(&mut space, &adverts, &mut pending, &mut last_rejection) {
                continue;
            }
            if place_music(&mut space, &mut music) {
                continue;
            }
            if place_music(&mut space, &mut reserve) {
                topped_up += 1;
                continue;
            }
            let upcoming = music.iter().chain(reserve.iter());
            match next_opportunity(&space, &adverts, &pending, upcoming) {
                Some(at) => space.idle_until(at.max(space.cursor() + 1)),
                None => break,
            }
        }
        if topped_up > 0 {
            log.push(format!(
                "music: {} reserve tracks filled time left by adverts",
                topped_up
            ));
        }

        // Whatever is still pending found no slot before closing
        let mut leftovers: BTreeMap<usize, u32> = BTreeMap::new();
        for repeat in &pending {
            *leftovers.entry(repeat.advert_index).or_insert(0) += 1;
        }
        for (index, count) in leftovers {
            let advert = &adverts[index];
            let reason = last_rejection
                .get(&index)
                .map(|r| r.to_string())
                .unwrap_or_else(|| "no slot left before closing".to_string());
            log.push(format!(
                "advert {}: {} admitted repeats not placed ({})",
                advert.id, count, reason
            ));
            not_fitted.push(NotFittedAdvert {
                advert_id: advert.id,
                length_secs: advert.length_secs,
                count,
                reason: NotFittedReason::Placement,
            });
        }

        let free_secs: i64 = space
            .segments()
            .iter()
            .filter(|segment| segment.state == SegmentState::Free)
            .map(|segment| segment.to - segment.from)
            .sum();
        log.push(format!("{} s of the window left free", free_secs));

        let items: Vec<ScheduledItem> = space
            .into_placements()
            .into_iter()
            .map(|placement| ScheduledItem {
                content_id: placement.key.id,
                kind: placement.key.kind,
                start: window.at(placement.start),
                length_secs: placement.length as u32,
                volume: object.volume_at(placement.key.kind, window.hour_at(placement.start)),
            })
            .collect();

        if let Some(last) = items.last() {
            let used = (last.end() - window.start).num_seconds();
            log.push(format!(
                "last item ends at {} into the window",
                secs_to_time_string(used)
            ));
        }

        let overloaded = calc.is_overloaded(&items);
        let loading = calc.get_loading(&items);
        info!(
            "object {} on {}: {} items, loading {:.1}%, {} repeats not fitted",
            object.id,
            date,
            items.len(),
            loading * 100.0,
            not_fitted.iter().map(|n| n.count).sum::<u32>()
        );

        if items.is_empty() {
            log.push("nothing could be scheduled".to_string());
            return PlaylistGeneratorResult {
                status: PlaylistGeneratorStatus::NotGenerated,
                playlist: None,
                not_fitted,
                debug_info: log.lines,
            };
        }

        PlaylistGeneratorResult {
            status: PlaylistGeneratorStatus::Generated,
            playlist: Some(Playlist {
                object_id: object.id,
                date,
                items,
                overloaded,
            }),
            not_fitted,
            debug_info: log.lines,
        }
    }
}

/// `Delete` result when the object does not operate on `date`
fn retraction(
    object: &ObjectInfo,
    date: NaiveDate,
    mut log: DebugLog,
) -> Option<PlaylistGeneratorResult> {
    if object.is_free_day(date) {
        log.push(format!(
            "object {}: {} is a free day ({})",
            object.id,
            date,
            date.weekday()
        ));
        return Some(delete_result(log.lines));
    }
    if object.open_duration_secs() <= 0 {
        log.push(format!(
            "object {}: no open hours ({} - {})",
            object.id, object.begin_time, object.end_time
        ));
        return Some(delete_result(log.lines));
    }
    None
}

fn delete_result(debug_info: Vec<String>) -> PlaylistGeneratorResult {
    PlaylistGeneratorResult {
        status: PlaylistGeneratorStatus::Delete,
        playlist: None,
        not_fitted: Vec::new(),
        debug_info,
    }
}

/// Seed for one object and date, so days differ but stay reproducible
fn run_seed(seed: u64, object_id: i64, date: NaiveDate) -> u64 {
    seed ^ (object_id as u64).rotate_left(32) ^ date.num_days_from_ce() as u64
}

/// Places the earliest-due advert repeat that is legal at the cursor
fn place_due_advert(
    space: &mut SpaceManager,
    adverts: &[Advert],
    pending: &mut Vec<RepeatTarget>,
    last_rejection: &mut HashMap<usize, Rejection>,
) -> bool {
    let cursor = space.cursor();
    for i in 0..pending.len() {
        let repeat = pending[i];
        if repeat.target > cursor {
            break;
        }
        let advert = &adverts[repeat.advert_index];
        match space.try_place(ContentKey::advert(advert.id), i64::from(advert.length_secs)) {
            Ok(_) => {
                pending.remove(i);
                return true;
            }
            Err(rejection) => {
                last_rejection.insert(repeat.advert_index, rejection);
            }
        }
    }
    false
}

/// Places the next music track, in pool order, that is legal at the cursor
///
/// Tracks that can no longer fit before closing are dropped.
fn place_music(space: &mut SpaceManager, music: &mut VecDeque<MusicTrack>) -> bool {
    music.retain(|track| {
        space
            .earliest_start(ContentKey::music(track.id), i64::from(track.length_secs))
            .is_some()
    });
    for i in 0..music.len() {
        let track = &music[i];
        if space
            .try_place(ContentKey::music(track.id), i64::from(track.length_secs))
            .is_ok()
        {
            music.remove(i);
            return true;
        }
    }
    false
}

/// Earliest offset after the cursor at which anything could be placed
fn next_opportunity<'a>(
    space: &SpaceManager,
    adverts: &[Advert],
    pending: &[RepeatTarget],
    music: impl Iterator<Item = &'a MusicTrack>,
) -> Option<i64> {
    let window_end = space.window_end();

    let adverts_next = pending.iter().filter_map(|repeat| {
        let advert = &adverts[repeat.advert_index];
        let length = i64::from(advert.length_secs);
        space
            .earliest_start(ContentKey::advert(advert.id), length)
            .map(|start| start.max(repeat.target))
            .filter(|&start| start + length <= window_end)
    });
    let music_next = music.filter_map(|track| {
        space.earliest_start(ContentKey::music(track.id), i64::from(track.length_secs))
    });

    adverts_next.chain(music_next).min()
}
