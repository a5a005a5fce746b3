//! Weather journal - look up forecasts for a place and date range, keep them
//! in a local journal and turn each summary into a theme and packing tips.

pub mod analyzer;
pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod presentation;
pub mod store;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use analyzer::{SummaryAnalysis, TemperatureExtract, Theme, Tip};
pub use client::JournalClient;
pub use config::JournalConfig;
pub use error::JournalError;
pub use export::ExportFormat;
pub use models::{Location, NewQuery, QueryUpdate, WeatherRecord};
pub use presentation::{RenderState, ResultView};
pub use store::QueryStore;
pub use weather::{OpenMeteoClient, WeatherSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, JournalError>;
