//! Pure derivations of the visible, ordered subset of each collection.
//!
//! Every function takes the full collection by reference and returns a new
//! vector; inputs are never mutated, so re-deriving a view from the same
//! inputs always yields the same output.

pub mod changelog;
pub mod feedback;
pub mod params;
pub mod roadmap;

pub use changelog::filter_changelog;
pub use feedback::filter_feedback;
pub use roadmap::{filter_roadmap, roadmap_board, RoadmapBoard};
