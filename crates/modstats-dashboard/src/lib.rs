//! Terminal dashboard for the moderator statistics API
//!
//! The dashboard fetches `/api/moderators` and the matching `/api/stats`
//! snapshot, then keeps them fresh on a poll timer. All view logic lives in
//! [`state::ClientViewState`]; [`client::DashboardClient`] drives it from a
//! [`api_client::DashboardSource`] and [`render`] turns it into text.

#![forbid(unsafe_code)]

pub mod api_client;
pub mod charts;
pub mod client;
pub mod commands;
pub mod filter;
pub mod navigation;
pub mod poll;
pub mod preferences;
pub mod render;
pub mod state;

pub use api_client::{ApiClient, CsvExport, DashboardSource};
pub use client::{ClientOptions, DashboardClient};
pub use navigation::DashboardLink;
pub use preferences::{JsonFilePreferences, MemoryPreferences, PreferenceStore, Theme};
pub use state::{ClientViewState, DashboardData, Event, Phase};
