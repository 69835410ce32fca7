pub mod correlation;
pub mod descriptive;
pub mod effect_size;
pub mod fdr;
pub mod significance;
