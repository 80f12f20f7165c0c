//! Screen flows for the pickup line generator.
//!
//! Each flow owns an explicit state struct and talks to the backend only
//! through an `Arc<dyn PickupApi>`. Flows never read each other's state;
//! cross-screen consistency comes from re-fetching.
//!
//! - [`GeneratorFlow`] - generate, regenerate, rate and copy one line
//! - [`HistoryFlow`] - list, filter, search and update past lines
//! - [`SettingsFlow`] - load and save generation settings
//! - [`StatsFlow`] - load the aggregate snapshot and shape it for display
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pickup_client::PickupClient;
//! use pickup_flows::GeneratorFlow;
//!
//! let api = Arc::new(PickupClient::from_env()?);
//! let generator = GeneratorFlow::new(api);
//! generator.init().await;
//! generator.set_description("loves hiking").await;
//! let generated = generator.generate().await?;
//! ```

mod ack;
mod clipboard;
mod error;
mod generator;
mod history;
mod settings;
mod stats;

pub use ack::{Acknowledgement, COPY_ACK_WINDOW, SAVE_ACK_WINDOW};
pub use clipboard::{Clipboard, ClipboardError, MemoryClipboard};
pub use error::{FlowError, LoadPart};
pub use generator::{DisplayedLine, GeneratorFlow, GeneratorState};
pub use history::{search_page, HistoryFlow, HistoryState, NotesDraft};
pub use settings::{SettingsFlow, SettingsState};
pub use stats::{
    average_rating_label, capitalize, format_rate, weekday_label, ActivityPoint, DirtinessBar,
    StatsFlow, StatsState, StatsView, StyleSlice, SuccessRow, NOT_AVAILABLE,
};

pub use pickup_core::{ApiError, PickupApi};
