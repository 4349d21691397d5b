pub mod latest_wins_queue;
pub mod live_pipeline;
pub mod pipeline_stats;
mod stages;

pub use stages::{ErrorCallback, PreviewCallback};
