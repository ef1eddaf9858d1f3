//! End-to-end generation runs against in-memory and failing catalogs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use tokio_util::sync::CancellationToken;

use playlist_scheduler::catalog::{Advert, AdvertLifetime, MusicTrack, ObjectInfo};
use playlist_scheduler::schedule::{ContentKind, NotFittedReason, ScheduledItem};
use playlist_scheduler::{
    Catalog, CatalogData, CatalogError, GeneratorConfig, GeneratorError, InMemoryCatalog,
    PlaylistGenerator, PlaylistGeneratorStatus,
};

// ===== Helpers =====

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn shop(id: i64, begin: u32, end: u32) -> ObjectInfo {
    ObjectInfo {
        id,
        name: format!("Shop {id}"),
        begin_time: NaiveTime::from_hms_opt(begin, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
        free_days: vec![Weekday::Sun],
        advert_volume: [100; 24],
        music_volume: [100; 24],
        keep_on_top: false,
        silent_time_secs: 0,
    }
}

fn advert(id: i64, length_secs: u32, repeats_per_day: u32) -> Advert {
    Advert {
        id,
        name: format!("Advert {id}"),
        length_secs,
        lifetimes: vec![AdvertLifetime {
            date_begin: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            date_end: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            archived: false,
        }],
        is_valid: true,
        repeats_per_day,
    }
}

fn tracks(count: i64, length_secs: u32) -> Vec<MusicTrack> {
    (1..=count)
        .map(|id| MusicTrack {
            id: 1000 + id,
            name: format!("Track {id}"),
            length_secs,
            genre: "pop".to_string(),
        })
        .collect()
}

/// Silence beyond the mandatory delay between items, including the tail
fn idle_secs(
    items: &[ScheduledItem],
    open: NaiveDateTime,
    close: NaiveDateTime,
    delay: i64,
) -> i64 {
    let mut idle = 0;
    let mut free_from = open;
    for item in items {
        idle += (item.start - free_from).num_seconds().max(0);
        free_from = item.end() + chrono::Duration::seconds(delay);
    }
    idle + (close - free_from).num_seconds().max(0)
}

fn generator(data: CatalogData, config: GeneratorConfig) -> PlaylistGenerator {
    PlaylistGenerator::new(Arc::new(InMemoryCatalog::new(data)), config)
}

/// Catalog whose object lookup never answers
struct StalledCatalog;

#[async_trait]
impl Catalog for StalledCatalog {
    async fn object(&self, _object_id: i64) -> Result<ObjectInfo, CatalogError> {
        std::future::pending().await
    }

    async fn valid_adverts(&self, _: i64, _: NaiveDate) -> Result<Vec<Advert>, CatalogError> {
        Ok(Vec::new())
    }

    async fn music_pool(&self, _: i64) -> Result<Vec<MusicTrack>, CatalogError> {
        Ok(Vec::new())
    }
}

/// Catalog that knows the object but cannot reach the advert store
struct BrokenAdvertStore;

#[async_trait]
impl Catalog for BrokenAdvertStore {
    async fn object(&self, object_id: i64) -> Result<ObjectInfo, CatalogError> {
        Ok(shop(object_id, 9, 21))
    }

    async fn valid_adverts(&self, _: i64, _: NaiveDate) -> Result<Vec<Advert>, CatalogError> {
        Err(CatalogError::Unreachable("advert store offline".to_string()))
    }

    async fn music_pool(&self, _: i64) -> Result<Vec<MusicTrack>, CatalogError> {
        Ok(tracks(10, 180))
    }
}

/// Catalog whose music query is slower than any sane timeout
struct SlowMusicStore;

#[async_trait]
impl Catalog for SlowMusicStore {
    async fn object(&self, object_id: i64) -> Result<ObjectInfo, CatalogError> {
        Ok(shop(object_id, 9, 21))
    }

    async fn valid_adverts(&self, _: i64, _: NaiveDate) -> Result<Vec<Advert>, CatalogError> {
        Ok(Vec::new())
    }

    async fn music_pool(&self, _: i64) -> Result<Vec<MusicTrack>, CatalogError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vec::new())
    }
}

// ===== Scenarios =====

#[tokio::test]
async fn heavy_advert_without_music_is_bounded_by_gap() {
    let config = GeneratorConfig {
        max_advert_sequence: 1,
        min_same_track_gap_secs: 600,
        delay_between_tracks_secs: 5,
        seed: Some(1),
        ..GeneratorConfig::default()
    };
    let data = CatalogData {
        objects: vec![shop(1, 9, 21)],
        adverts: vec![advert(7, 30, 200)],
        ..CatalogData::default()
    };

    let result = generator(data, config).generate(1, monday()).await.unwrap();
    assert_eq!(result.status, PlaylistGeneratorStatus::Generated);

    let playlist = result.playlist.as_ref().unwrap();
    let placed = playlist.count_of(ContentKind::Advert) as u32;
    // One play every 30 + 5 + 600 seconds at best
    assert_eq!(placed, 68);
    assert_eq!(placed + result.not_fitted_count(), 200);
    assert_eq!(result.not_fitted.len(), 1);
    assert_eq!(result.not_fitted[0].advert_id, 7);
    assert_eq!(result.not_fitted[0].count, 132);
    assert_eq!(result.not_fitted[0].reason, NotFittedReason::Spacing);
    assert!(!playlist.overloaded);
}

#[tokio::test]
async fn music_fills_time_the_repeat_gap_leaves_free() {
    let config = GeneratorConfig {
        max_advert_sequence: 1,
        min_same_track_gap_secs: 600,
        delay_between_tracks_secs: 5,
        seed: Some(3),
        ..GeneratorConfig::default()
    };
    let data = CatalogData {
        objects: vec![shop(1, 9, 21)],
        adverts: vec![advert(7, 30, 1000)],
        tracks: tracks(400, 180),
        ..CatalogData::default()
    };

    let result = generator(data, config).generate(1, monday()).await.unwrap();
    let playlist = result.playlist.as_ref().unwrap();
    assert!(playlist.count_of(ContentKind::Advert) > 0);
    assert!(playlist.count_of(ContentKind::Music) < 400);
    assert_eq!(
        playlist.count_of(ContentKind::Advert) as u32 + result.not_fitted_count(),
        1000
    );

    let open = monday().and_hms_opt(9, 0, 0).unwrap();
    let close = monday().and_hms_opt(21, 0, 0).unwrap();
    assert!(idle_secs(&playlist.items, open, close, 5) < 180 + 5);
}

#[tokio::test]
async fn every_advert_plays_under_heavy_demand() {
    let config = GeneratorConfig {
        max_advert_sequence: 2,
        min_same_track_gap_secs: 600,
        delay_between_tracks_secs: 1,
        seed: Some(5),
        ..GeneratorConfig::default()
    };
    let data = CatalogData {
        objects: vec![shop(1, 9, 21)],
        adverts: (1..=20).map(|id| advert(id, 5, 2000)).collect(),
        tracks: tracks(2000, 180),
        ..CatalogData::default()
    };

    let result = generator(data, config).generate(1, monday()).await.unwrap();
    assert!(!result
        .not_fitted
        .iter()
        .any(|n| n.reason == NotFittedReason::Capacity));

    let playlist = result.playlist.as_ref().unwrap();
    for id in 1..=20 {
        assert!(
            playlist
                .items
                .iter()
                .any(|i| i.kind == ContentKind::Advert && i.content_id == id),
            "advert {} never plays",
            id
        );
    }
    assert!(playlist.count_of(ContentKind::Music) > 0);

    let open = monday().and_hms_opt(9, 0, 0).unwrap();
    let close = monday().and_hms_opt(21, 0, 0).unwrap();
    assert!(idle_secs(&playlist.items, open, close, 1) < 180 + 1);
}

#[tokio::test]
async fn free_day_deletes_playlist() {
    let data = CatalogData {
        objects: vec![shop(1, 9, 21)],
        adverts: vec![advert(7, 30, 10)],
        tracks: tracks(20, 180),
        ..CatalogData::default()
    };
    let sunday = NaiveDate::from_ymd_opt(2026, 10, 25).unwrap();

    let result = generator(data, GeneratorConfig::default())
        .generate(1, sunday)
        .await
        .unwrap();
    assert_eq!(result.status, PlaylistGeneratorStatus::Delete);
    assert!(result.playlist.is_none());
    assert!(result.not_fitted.is_empty());
}

#[tokio::test]
async fn short_music_pool_leaves_tail_empty() {
    let data = CatalogData {
        objects: vec![shop(1, 9, 21)],
        tracks: tracks(10, 200),
        ..CatalogData::default()
    };

    let result = generator(data, GeneratorConfig::default())
        .generate(1, monday())
        .await
        .unwrap();
    assert_eq!(result.status, PlaylistGeneratorStatus::Generated);
    assert!(result.not_fitted.is_empty());

    let playlist = result.playlist.unwrap();
    assert!(!playlist.overloaded);
    assert_eq!(playlist.items.len(), 10);
    assert_eq!(playlist.total_secs(), 2000);
    let closing = monday().and_hms_opt(21, 0, 0).unwrap();
    assert!(playlist.items.last().unwrap().end() < closing);
}

#[tokio::test]
async fn window_may_cross_midnight() {
    let data = CatalogData {
        objects: vec![shop(2, 22, 2)],
        tracks: tracks(100, 240),
        ..CatalogData::default()
    };

    let result = generator(data, GeneratorConfig::default())
        .generate(2, monday())
        .await
        .unwrap();
    let playlist = result.playlist.unwrap();
    let tuesday = monday().succ_opt().unwrap();

    assert_eq!(playlist.date, monday());
    assert!(playlist.items.iter().any(|i| i.start.date() == tuesday));
    let closing = tuesday.and_hms_opt(2, 0, 0).unwrap();
    assert!(playlist.items.iter().all(|i| i.end() <= closing));
}

#[tokio::test]
async fn seeded_runs_are_identical() {
    let data = CatalogData {
        objects: vec![shop(1, 9, 21)],
        adverts: vec![advert(1, 30, 40), advert(2, 45, 25), advert(3, 15, 60)],
        tracks: tracks(150, 210),
        ..CatalogData::default()
    };
    let config = GeneratorConfig {
        seed: Some(99),
        delay_between_tracks_secs: 2,
        ..GeneratorConfig::default()
    };

    let first = generator(data.clone(), config.clone())
        .generate(1, monday())
        .await
        .unwrap();
    let second = generator(data, config).generate(1, monday()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn range_covers_every_day() {
    let data = CatalogData {
        objects: vec![shop(1, 9, 21)],
        adverts: vec![advert(1, 30, 12)],
        tracks: tracks(300, 180),
        ..CatalogData::default()
    };

    let results = generator(data, GeneratorConfig::default())
        .generate_range(1, monday(), 7)
        .await
        .unwrap();
    assert_eq!(results.len(), 7);
    for (offset, (date, result)) in results.iter().enumerate() {
        assert_eq!(*date, monday() + chrono::Duration::days(offset as i64));
        let expected = if offset == 6 {
            PlaylistGeneratorStatus::Delete
        } else {
            PlaylistGeneratorStatus::Generated
        };
        assert_eq!(result.status, expected, "day {}", date);
    }
}

// ===== Failures =====

#[tokio::test]
async fn unknown_object_is_data_unavailable() {
    let result = generator(CatalogData::default(), GeneratorConfig::default())
        .generate(404, monday())
        .await;
    assert!(matches!(
        result,
        Err(GeneratorError::DataUnavailable(CatalogError::ObjectNotFound(404)))
    ));
}

#[tokio::test]
async fn failing_query_aborts_run() {
    let generator = PlaylistGenerator::new(Arc::new(BrokenAdvertStore), GeneratorConfig::default());
    assert!(matches!(
        generator.generate(1, monday()).await,
        Err(GeneratorError::DataUnavailable(CatalogError::Unreachable(_)))
    ));
}

#[tokio::test(start_paused = true)]
async fn slow_query_times_out() {
    let config = GeneratorConfig {
        query_timeout_secs: 1,
        ..GeneratorConfig::default()
    };
    let generator = PlaylistGenerator::new(Arc::new(SlowMusicStore), config);
    assert!(matches!(
        generator.generate(1, monday()).await,
        Err(GeneratorError::DataUnavailable(CatalogError::Timeout(_)))
    ));
}

#[tokio::test]
async fn invalid_configuration_is_rejected_up_front() {
    let config = GeneratorConfig {
        min_same_track_gap_secs: -1,
        ..GeneratorConfig::default()
    };
    let generator = PlaylistGenerator::new(Arc::new(StalledCatalog), config);
    assert!(matches!(
        generator.generate(1, monday()).await,
        Err(GeneratorError::InvalidConfiguration(_))
    ));
}

#[tokio::test]
async fn cancellation_interrupts_pending_query() {
    let generator = Arc::new(PlaylistGenerator::new(
        Arc::new(StalledCatalog),
        GeneratorConfig::default(),
    ));
    let cancel = CancellationToken::new();

    let run = {
        let generator = Arc::clone(&generator);
        let cancel = cancel.clone();
        tokio::spawn(async move { generator.generate_with_cancel(1, monday(), &cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let result = run.await.unwrap();
    assert!(matches!(result, Err(GeneratorError::Cancelled)));
}
