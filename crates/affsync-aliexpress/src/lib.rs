pub mod client;
pub mod error;
pub mod sign;
pub mod types;

pub use client::{AliexpressClient, ProductQuery, PAGE_SIZE, PRODUCT_QUERY_METHOD};
pub use error::AliexpressError;
pub use types::{FetchedProducts, ProductPage, StopReason};
