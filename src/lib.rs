pub mod client;
pub mod config;
pub mod error;
pub mod server;
pub mod tools;

pub use client::{ContentRecord, ContentType, SearchSession, SessionToken};
pub use client::{BulkSearchResult, MetaSearchClient, MetaSearchConfig};
pub use config::{Config, ConfigOverrides, Credentials};
pub use error::{Error, Result};
pub use server::Server;
pub use tools::{SearchStatistics, SearchTool};
