//! Data models for the weather journal
//!
//! - Location: geocoded place with coordinates
//! - Record: stored queries and the request bodies that create or change them

pub mod location;
pub mod record;

pub use location::Location;
pub use record::{NewQuery, QueryUpdate, WeatherRecord};
