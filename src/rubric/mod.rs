pub mod config;
pub mod registry;
pub mod validation;

pub use config::{default_rubrics, Criterion, RubricConfig, Round};
pub use registry::RubricRegistry;
pub use validation::validate_rubrics;
