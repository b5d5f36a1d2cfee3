//! Feed-level rules shared by the engine: freshness, slicing, and filters.

pub mod filters;
pub mod freshness;
pub mod page;

pub use filters::{FeedFilters, FilterResolver, StaticFilterResolver};
pub use freshness::{FreshnessMarks, FreshnessPolicy, is_fresh};
pub use page::slice_page;
