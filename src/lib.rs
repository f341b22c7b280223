// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod categorize;
pub mod config;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::error::{PipelineError, SourceFailure, StoreError};
pub use crate::ingest::types::{SourceAdapter, SourceDescriptor, SourceKind};
pub use crate::model::{Category, ContentItem};
pub use crate::pipeline::{Pipeline, RunReport};
pub use crate::store::Store;
