pub mod env;
pub mod metrics;
pub mod types;
pub mod utils;
