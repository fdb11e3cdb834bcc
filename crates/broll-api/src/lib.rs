//! HTTP API for b-roll enrichment jobs.
//!
//! Submits jobs to the stream and answers status polls from the job
//! record store. All processing happens in the worker.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
