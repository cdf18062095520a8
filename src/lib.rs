//! Reconstruction of contactless reader polling loops from passively
//! captured frames: rollover correction, cycle detection, phase alignment,
//! loop segmentation and per-frame command labels.

pub mod capture;
pub mod core;
pub mod engine;
pub mod observability;
pub mod stages;
