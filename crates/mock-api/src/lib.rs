//! Mock backends for the pickup line client.
//!
//! This crate provides implementations of the `PickupApi` trait for testing:
//! - `InMemoryApi` - A working in-process backend that records every call
//! - `FailingApi` - Fails every call with a fixed error
//! - `DelayedApi` - Wraps another API with artificial latency
//!
//! For a real backend, use the `pickup-client` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_api::{InMemoryApi, PickupApi};
//! use pickup_core::{GenerateRequest, Style};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_api::ApiError> {
//!     let api = InMemoryApi::new();
//!
//!     let generated = api
//!         .generate(GenerateRequest::new("loves hiking", 7, Style::Funny))
//!         .await?;
//!     println!("{} ({})", generated.pickup_line, generated.history_id);
//!     Ok(())
//! }
//! ```

mod delayed;
mod failing;
mod memory;

pub mod fixtures;

// Re-export pickup-core types for convenience
pub use pickup_core::{async_trait, ApiError, PickupApi};

pub use delayed::DelayedApi;
pub use failing::FailingApi;
pub use memory::{default_catalog, Call, InMemoryApi, Operation};
