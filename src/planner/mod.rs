//! Turning translator text into a validated edit plan

pub mod extractor;
pub mod normalizer;
pub mod prompt;

pub use extractor::PlanExtractor;
pub use normalizer::{Normalization, PlanNormalizer};
pub use prompt::system_prompt;
