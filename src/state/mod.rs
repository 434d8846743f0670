//! State module for tracking a scrape run
//!
//! # Components
//!
//! - `PipelineState`: The phase a pipeline run is in (idle, fetching, completed, ...)
//! - `Aggregator`: Deduplicated, ordered accumulation of movie records

mod aggregator;
mod pipeline_state;

// Re-export main types
pub use aggregator::Aggregator;
pub use pipeline_state::PipelineState;
