//! Commit graph layout: lane assignment and hidden-branch filtering.

pub mod hidden;
pub mod lanes;
pub mod walk;

pub use hidden::{HiddenCommitSolver, HideTag};
pub use lanes::{DEFAULT_MAX_LANES, LaneConfig, LaneFrame, LaneGenerator};
pub use walk::{GraphRow, Pass, Progress, WalkOptions, build_graph};
