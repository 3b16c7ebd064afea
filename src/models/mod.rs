//! Data models for the CineSky application
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates and metadata
//! - Weather: Current conditions as shown on the dashboard
//! - Forecast: Daily forecast bundles and date selection

pub mod forecast;
pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use forecast::{DailyOutlook, ForecastBundle};
pub use location::Location;
pub use weather::CurrentConditions;
