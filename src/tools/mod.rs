pub mod search;
pub mod statistics;

pub use search::{BulkSearchInput, SearchInput, SearchTool};
pub use statistics::{BulkStatistics, SearchStatistics};
