pub mod classifier;
pub mod event;
pub mod format;

pub use classifier::classify;
pub use event::{FrameBatch, FrameType, Loop, LoopEvent, RawFrame, CONTINUOUS};
