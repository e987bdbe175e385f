pub mod base;
pub mod factory;

pub use base::{SourceAdapter, SourceOutcome};
pub use factory::create_adapters;
