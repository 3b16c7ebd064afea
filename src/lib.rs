//! `CineSky` - Weather intelligence and shoot planning for filmmakers
//!
//! This library provides the core functionality for weather lookups,
//! golden/blue-hour timing, and shoot planning recommendations.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod email;
pub mod error;
pub mod light;
pub mod location_resolver;
pub mod map;
pub mod models;
pub mod refresh;
pub mod routes;
pub mod shoot;
pub mod store;
pub mod web;

// Re-export core types for public API
pub use api::{GeocodingResult, LocationInput, LocationParser, WeatherApiClient};
pub use auth::{AuthService, Session};
pub use config::CineSkyConfig;
pub use error::CineSkyError;
pub use light::{DayLighting, LightWindow, OffsetProfile, SolarTimes};
pub use models::{CurrentConditions, DailyOutlook, ForecastBundle, Location};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, CineSkyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
