pub mod types;
pub mod slot_utils;
pub mod space;
pub mod loading;
pub mod pool;
pub mod spacing;
pub mod generator;

pub use types::{
    ContentKey, ContentKind, NotFittedAdvert, NotFittedReason, Playlist, PlaylistGeneratorResult,
    PlaylistGeneratorStatus, ScheduledItem,
};
pub use slot_utils::{compute_window, secs_to_time_string, Window};
pub use space::{Rejection, Segment, SegmentState, SpaceManager};
pub use loading::LoadingCalculator;
pub use pool::{fetch_candidates, TrackPoolLoader, TrackSelection};
pub use spacing::{spread_repeats, RepeatTarget};
pub use generator::PlaylistGenerator;
