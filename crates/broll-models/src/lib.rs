//! Shared data models for the b-roll enrichment pipeline.
//!
//! This crate holds the pure types exchanged between the API, queue,
//! store and worker crates, plus the timeline-derivation algorithm used
//! by the video assembler. Nothing here touches the network or the
//! filesystem, so every invariant is unit-testable in isolation.

pub mod broll;
pub mod job;
pub mod plan;
pub mod timeline;

pub use broll::{BrollClip, KeywordCandidate};
pub use job::{JobId, JobRecord, JobStatus, TransitionError};
pub use plan::{EditAction, EditInstruction, EditPlan};
pub use timeline::{build_timeline, covered_length, TimelineSegment};
