//! Daily audio playlists for retail objects
//!
//! Music and advert repeats are laid out over an object's open hours. The
//! generator reads everything through the [`Catalog`] trait and reports
//! what did not fit next to the playlist itself.

pub mod catalog;
pub mod config;
pub mod display;
pub mod error;
pub mod schedule;

pub use catalog::{load_catalog, parse_catalog, Catalog, CatalogData, InMemoryCatalog};
pub use crate::config::GeneratorConfig;
pub use error::{CatalogError, GeneratorError, PoolError};
pub use schedule::{PlaylistGenerator, PlaylistGeneratorResult, PlaylistGeneratorStatus};
