pub mod async_pipeline;
pub mod config;
pub mod pipeline;
pub mod runtime;
pub mod state;

pub use async_pipeline::AsyncLoopPipeline;
pub use config::PipelineConfig;
pub use pipeline::{Display, DisplayMode, LoopPipeline, LoopView};
pub use runtime::{ObserveRuntime, RuntimeStatus};
pub use state::PipelineState;
