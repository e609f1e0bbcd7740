//! Raider.IO Score Comparison
//!
//! Builds a single chart comparing the Mythic+ scores of a roster of
//! characters, one slot per (class, spec):
//! - Roster loading and validation against the class/spec registry
//! - Sequential profile fetching behind the `ProfileFetcher` seam
//! - Raid progression parsing and completion colour buckets
//! - A raster renderer with preloaded icons and atomic output

pub mod classes;
pub mod datasets;
pub mod error;
pub mod fetch;
pub mod handler;
pub mod model;
pub mod render;
pub mod roster;
pub mod settings;

// Re-exports for convenience
pub use classes::{build_index, ClassSpecRegistry, LayoutIndex, LayoutTable};
pub use datasets::Dataset;
pub use error::{ComparisonError, Result};
pub use fetch::{ProfileFetcher, RaiderIoClient};
pub use handler::{BatchFailure, BatchReport, ProfileHandler};
pub use model::{Profile, Progression};
pub use render::{AssetStore, OutputTarget, Plotter};
pub use roster::Roster;
pub use settings::{OutputFormat, Settings};
