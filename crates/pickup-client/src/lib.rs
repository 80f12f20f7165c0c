//! HTTP client for the pickup line generator backend.
//!
//! This crate provides the REST facade the screen flows talk to. It supports:
//!
//! - Generating and regenerating pickup lines
//! - Listing, rating, annotating and deleting history records
//! - Reading and saving per-user settings and the model catalog
//! - Logging in or registering to obtain a bearer token
//!
//! # Example
//!
//! ```no_run
//! use pickup_client::{ClientConfig, PickupApi, PickupClient};
//! use pickup_core::{GenerateRequest, Style};
//!
//! # async fn example() -> Result<(), pickup_core::ApiError> {
//! let client = PickupClient::login(ClientConfig::default(), "demo", "hunter2").await?;
//!
//! let generated = client
//!     .generate(GenerateRequest::new("loves hiking", 7, Style::Funny))
//!     .await?;
//! println!("{} (history id {})", generated.pickup_line, generated.history_id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;

pub use client::{CurrentUser, PickupClient};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use pickup_core::{ApiError, PickupApi};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
