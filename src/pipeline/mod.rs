// Search pipeline: per-source pagination and cross-source aggregation

pub mod aggregator;
pub mod paginator;

pub use aggregator::Aggregator;
pub use paginator::{PaginationRun, Paginator, StopReason};
