pub mod aligner;
pub mod cycle;
pub mod normalizer;
pub mod segmenter;

pub use aligner::align;
pub use cycle::detect_cycle;
pub use normalizer::EventNormalizer;
pub use segmenter::segment;
