//! Core library of the fantasy-map converter: decodes the two terrain
//! feeds, builds the cell graph, folds cells into a five-tier feudal
//! hierarchy and exposes the polygon/color payloads the raster exporter
//! consumes.

pub mod error;
pub mod feature;
pub mod graph;
pub mod holdings;
pub mod ingest;
pub mod map;
pub mod palette;
pub mod project;
pub mod titles;

// Re-export the types most callers need
pub use error::ConvertError;
pub use map::{FillGroup, RealmMap};
pub use project::{MAP_HEIGHT, MAP_WIDTH};
