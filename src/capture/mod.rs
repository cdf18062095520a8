pub mod simulated;
pub mod traits;
pub mod types;

pub use simulated::{PatternFrame, SimulatedReader};
pub use traits::FrameSource;
pub use types::{capture_channel, CaptureSender, SourceState};
