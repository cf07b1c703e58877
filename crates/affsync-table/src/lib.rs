pub mod client;
pub mod error;
pub mod schema;
pub mod sink;

pub use client::TableClient;
pub use error::TableError;
pub use schema::{discover_schema, DiscoveredSchema, SchemaSource};
pub use sink::TableSink;
