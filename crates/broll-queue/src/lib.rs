//! Redis Streams task queue for enrichment jobs.
//!
//! Delivery semantics are at-least-once: a consumer group hands each
//! message to one worker, and messages left pending by a crashed worker
//! are reclaimed after an idle threshold. The pipeline tolerates
//! duplicate invocation because job state is fully replaced each run.

mod error;
mod job;
mod queue;

pub use error::{QueueError, QueueResult};
pub use job::ProcessVideoJob;
pub use queue::{JobQueue, QueueConfig};
