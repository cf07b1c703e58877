pub mod app_config;
pub mod config;
pub mod error;
pub mod flatten;
pub mod record;
pub mod sanitize;
pub mod schema;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use flatten::{flatten_products, format_run_timestamp, FlattenedDataset};
pub use record::{FieldValue, Record};
pub use sanitize::{sanitize_record, sanitize_records};
pub use schema::{DestinationSchema, DEFAULT_FALLBACK_COLUMNS};
