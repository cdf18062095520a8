pub mod collector;
pub mod logging;
pub mod metrics;
pub mod monitor;

pub use collector::{MetricsCollector, MetricsSnapshot};
pub use logging::init_logging;
pub use metrics::StageMetrics;
pub use monitor::PipelineMonitor;
