use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::types::SourceState;
use crate::core::FrameBatch;

/// Anything that yields polling frame batches in delivery order
#[async_trait]
pub trait FrameSource: Send {
    /// Called once before `start` with source-specific settings
    async fn configure(&mut self, config: Value) -> Result<()>;

    async fn start(&mut self) -> Result<()>;

    /// Next batch, or `None` once the source has nothing more to give
    async fn next_batch(&mut self) -> Result<Option<FrameBatch>>;

    async fn stop(&mut self) -> Result<()>;

    fn state(&self) -> SourceState;
}
