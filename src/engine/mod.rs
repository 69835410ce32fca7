pub mod aligner;
pub mod dose_response;
pub mod interaction;
pub mod lag;
pub mod orchestrator;
pub mod types;

pub use orchestrator::{aligned_points, run_analysis};
