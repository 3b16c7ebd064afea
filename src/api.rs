//! Weather API client for the upstream REST services
//!
//! This module provides HTTP client functionality for retrieving current
//! conditions and geocoding results from an OpenWeatherMap-style API and
//! daily forecasts from a WeatherXu-style API, with rate limiting, retry
//! logic, and error handling. The API key travels as a query parameter
//! and is stripped before URLs are logged.

use crate::config::CineSkyConfig;
use crate::models::{location, CurrentConditions, DailyOutlook, ForecastBundle, Location};
use crate::CineSkyError;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

/// Rate limiter for API requests
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum requests per minute
    max_requests_per_minute: u32,
    /// Request timestamps within the current minute
    request_times: Vec<Instant>,
    /// Last cleanup time
    last_cleanup: Instant,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(max_requests_per_minute: u32) -> Self {
        Self {
            max_requests_per_minute,
            request_times: Vec::new(),
            last_cleanup: Instant::now(),
        }
    }

    /// Check if a request is allowed and record it
    pub fn allow_request(&mut self) -> bool {
        self.cleanup_old_requests();

        if self.request_times.len() >= self.max_requests_per_minute as usize {
            false
        } else {
            self.request_times.push(Instant::now());
            true
        }
    }

    /// Get time until next request is allowed
    pub fn time_until_next_request(&mut self) -> Duration {
        self.cleanup_old_requests();

        if self.request_times.len() < self.max_requests_per_minute as usize {
            Duration::from_secs(0)
        } else if let Some(oldest) = self.request_times.first() {
            let elapsed = oldest.elapsed();
            if elapsed >= Duration::from_secs(60) {
                Duration::from_secs(0)
            } else {
                Duration::from_secs(60) - elapsed
            }
        } else {
            Duration::from_secs(0)
        }
    }

    /// Remove requests older than 1 minute
    fn cleanup_old_requests(&mut self) {
        let now = Instant::now();
        if now.duration_since(self.last_cleanup) >= Duration::from_secs(10) {
            let cutoff = now - Duration::from_secs(60);
            self.request_times.retain(|&time| time > cutoff);
            self.last_cleanup = now;
        }
    }
}

/// Client for the upstream weather services
pub struct WeatherApiClient {
    /// HTTP client
    client: Client,
    /// API configuration
    config: CineSkyConfig,
    /// Rate limiter (locked briefly around bookkeeping, never across awaits)
    rate_limiter: Mutex<RateLimiter>,
}

impl WeatherApiClient {
    /// Create a new weather API client
    pub fn new(config: CineSkyConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.weather.timeout_seconds.into());

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("CineSky/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        if config.weather.api_key.is_none() {
            warn!("No weather API key configured; upstream requests will be rejected");
        }

        // Free-tier limit of the conditions API: 60 requests per minute
        let rate_limiter = Mutex::new(RateLimiter::new(60));

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    fn api_key(&self) -> &str {
        self.config.weather.api_key.as_deref().unwrap_or_default()
    }

    /// Get current conditions for a coordinate
    #[instrument(skip(self))]
    pub async fn current_conditions(&self, lat: f64, lon: f64) -> Result<CurrentConditions> {
        info!("Getting current conditions for coordinates: {:.4}, {:.4}", lat, lon);

        let url = format!(
            "{}/weather?lat={}&lon={}&units=metric&appid={}",
            self.config.weather.conditions_base_url,
            lat,
            lon,
            self.api_key()
        );

        let response = self.make_request(&url).await?;
        self.parse_current(response).await
    }

    /// Get current conditions for a free-text city name
    #[instrument(skip(self))]
    pub async fn current_conditions_by_city(&self, city: &str) -> Result<CurrentConditions> {
        info!("Getting current conditions for city: '{}'", city);

        let url = format!(
            "{}/weather?q={}&units=metric&appid={}",
            self.config.weather.conditions_base_url,
            urlencoding::encode(city),
            self.api_key()
        );

        let response = self.make_request(&url).await?;
        self.parse_current(response).await
    }

    async fn parse_current(&self, response: Response) -> Result<CurrentConditions> {
        let current: openweather::CurrentResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse current-conditions response")
            .map_err(|e| {
                error!("Failed to parse weather response: {}", e);
                CineSkyError::api("Invalid weather data received from the conditions API")
            })?;

        Ok(current.into())
    }

    /// Get the daily forecast for a coordinate (WeatherXu-style API).
    /// This is the feed the golden-hour calculator reads its
    /// sunrise/sunset instants from.
    #[instrument(skip(self))]
    pub async fn daily_forecast(&self, lat: f64, lon: f64) -> Result<ForecastBundle> {
        info!("Getting daily forecast for coordinates: {:.4}, {:.4}", lat, lon);

        let url = format!(
            "{}/weather?lat={}&lon={}&api_key={}",
            self.config.weather.forecast_base_url,
            lat,
            lon,
            self.api_key()
        );

        let response = self.make_request(&url).await?;

        let forecast_response: weatherxu::ForecastResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse daily forecast response")
            .map_err(|e| {
                error!("Failed to parse forecast response: {}", e);
                CineSkyError::api("Invalid forecast data received from the forecast API")
            })?;

        if !forecast_response.success {
            return Err(CineSkyError::api("Forecast API response was not successful").into());
        }

        let data = forecast_response
            .data
            .ok_or_else(|| CineSkyError::api("Forecast response carried no data"))?;

        let daily = data
            .daily
            .ok_or_else(|| CineSkyError::api("Daily forecast data not available"))?;

        let days: Vec<DailyOutlook> = daily
            .data
            .iter()
            .map(weatherxu::DailyEntry::to_outlook)
            .collect();

        info!("Retrieved forecast with {} daily entries", days.len());

        let name = location::label_from_timezone(&data.timezone);
        let location = Location::new(lat, lon, name);
        Ok(ForecastBundle::new(location, data.timezone, days))
    }

    /// Get geocoding information for a location name
    #[instrument(skip(self), fields(location = location_name))]
    pub async fn geocode(&self, location_name: &str) -> Result<Vec<GeocodingResult>> {
        info!("Geocoding location: '{}'", location_name);

        let url = format!(
            "{}/direct?q={}&limit=5&appid={}",
            self.config.weather.geocoding_base_url,
            urlencoding::encode(location_name),
            self.api_key()
        );

        let response = self.make_request(&url).await?;

        let results: Vec<GeocodingResult> = response
            .json()
            .await
            .with_context(|| "Failed to parse geocoding response")
            .map_err(|e| {
                error!("Failed to parse geocoding response for '{}': {}", location_name, e);
                CineSkyError::api("Invalid geocoding data received from the geocoding API")
            })?;

        if results.is_empty() {
            warn!("No results found for location '{}'", location_name);
        } else {
            debug!(
                "Geocoding results: {:?}",
                results
                    .iter()
                    .map(|r| format!("{} ({:.4}, {:.4})", r.name, r.lat, r.lon))
                    .collect::<Vec<_>>()
            );
        }

        Ok(results)
    }

    /// Get reverse geocoding information for coordinates
    #[instrument(skip(self))]
    pub async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<Vec<GeocodingResult>> {
        let url = format!(
            "{}/reverse?lat={}&lon={}&limit=1&appid={}",
            self.config.weather.geocoding_base_url,
            lat,
            lon,
            self.api_key()
        );

        let response = self.make_request(&url).await?;

        let results: Vec<GeocodingResult> = response
            .json()
            .await
            .with_context(|| "Failed to parse reverse geocoding response")
            .map_err(|_| CineSkyError::api("Invalid reverse geocoding data received"))?;

        Ok(results)
    }

    /// Make a request with rate limiting and retry logic
    #[instrument(skip(self, url), fields(url = %strip_key(url)))]
    async fn make_request(&self, url: &str) -> Result<Response> {
        let mut attempt = 0;
        let max_attempts = self.config.weather.max_retries + 1;

        debug!("Starting HTTP request (max attempts: {})", max_attempts);

        while attempt < max_attempts {
            // Rate limiting
            let wait_time = {
                let mut limiter = self.rate_limiter.lock().unwrap();
                if limiter.allow_request() {
                    None
                } else {
                    Some(limiter.time_until_next_request())
                }
            };
            if let Some(wait_time) = wait_time {
                if wait_time > Duration::from_secs(0) {
                    warn!("Rate limit exceeded, waiting {:.1}s", wait_time.as_secs_f64());
                    if attempt == 0 {
                        return Err(CineSkyError::api(format!(
                            "Rate limit exceeded. Please wait {} seconds.",
                            wait_time.as_secs()
                        ))
                        .into());
                    }
                    tokio::time::sleep(wait_time).await;
                }
                continue;
            }

            debug!("Making HTTP request (attempt {}/{})", attempt + 1, max_attempts);

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!("HTTP response received: {}", status);

                    if status.is_success() {
                        return Ok(response);
                    } else if status.as_u16() == 401 {
                        error!("API authentication failed (HTTP 401)");
                        return Err(CineSkyError::api(
                            "Invalid API key. Please check your weather API key.",
                        )
                        .into());
                    } else if status.as_u16() == 404 {
                        warn!("Location not found (HTTP 404)");
                        return Err(CineSkyError::api(
                            "Location not found. Please check the coordinates or location name.",
                        )
                        .into());
                    } else if status.as_u16() == 429 {
                        // Rate limited by server
                        let retry_after = response
                            .headers()
                            .get("retry-after")
                            .and_then(|h| h.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(60);

                        warn!(
                            "Server rate limit exceeded (HTTP 429), retry after {}s",
                            retry_after
                        );

                        if attempt < max_attempts - 1 {
                            tokio::time::sleep(Duration::from_secs(retry_after)).await;
                            attempt += 1;
                            continue;
                        }
                        error!("Rate limit exceeded and retry attempts exhausted");
                        return Err(CineSkyError::api(
                            "Rate limit exceeded and retry attempts exhausted.",
                        )
                        .into());
                    } else {
                        let error_msg = format!(
                            "API request failed with status: {} - {}",
                            status,
                            status.canonical_reason().unwrap_or("Unknown error")
                        );

                        warn!("HTTP error on attempt {}: {}", attempt + 1, error_msg);

                        if attempt < max_attempts - 1 {
                            // Exponential backoff for server errors
                            let backoff = Duration::from_millis(1000 * (2_u64.pow(attempt)));
                            tokio::time::sleep(backoff).await;
                            attempt += 1;
                            continue;
                        }
                        error!("API request failed after all attempts: {}", error_msg);
                        return Err(CineSkyError::api(error_msg).into());
                    }
                }
                Err(e) => {
                    warn!("Network error on attempt {}: {}", attempt + 1, e);

                    if attempt < max_attempts - 1 {
                        let backoff = Duration::from_millis(1000 * (2_u64.pow(attempt)));
                        tokio::time::sleep(backoff).await;
                        attempt += 1;
                        continue;
                    }
                    error!("Network error after {} attempts: {}", max_attempts, e);
                    return Err(CineSkyError::api(format!(
                        "Network error after {max_attempts} attempts: {e}"
                    ))
                    .into());
                }
            }
        }

        error!("Request failed after all retry attempts");
        Err(CineSkyError::api("Request failed after all retry attempts").into())
    }
}

/// Drop the API key query parameter before a URL reaches the logs
fn strip_key(url: &str) -> &str {
    url.split("appid=")
        .next()
        .and_then(|u| u.split("api_key=").next())
        .unwrap_or(url)
}

/// OpenWeatherMap-style response structures
mod openweather {
    use super::*;

    #[derive(Debug, Deserialize)]
    pub struct CurrentResponse {
        pub name: String,
        pub sys: SysData,
        pub main: MainData,
        pub weather: Vec<WeatherEntry>,
        pub wind: Option<WindData>,
        /// Visibility in meters
        pub visibility: Option<f32>,
        /// Observation time as epoch seconds
        pub dt: Option<i64>,
    }

    #[derive(Debug, Deserialize)]
    pub struct SysData {
        pub country: Option<String>,
        pub sunrise: Option<i64>,
        pub sunset: Option<i64>,
    }

    #[derive(Debug, Deserialize)]
    pub struct MainData {
        pub temp: f32,
        pub humidity: u8,
        pub pressure: f32,
    }

    #[derive(Debug, Deserialize)]
    pub struct WeatherEntry {
        pub main: String,
        pub description: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct WindData {
        pub speed: f32,
        pub deg: Option<u16>,
    }

    impl From<CurrentResponse> for CurrentConditions {
        fn from(response: CurrentResponse) -> Self {
            let (condition, description) = response
                .weather
                .first()
                .map(|w| (w.main.clone(), w.description.clone()))
                .unwrap_or_else(|| ("Unknown".to_string(), "unknown".to_string()));

            let observed_at = response
                .dt
                .and_then(|s| DateTime::from_timestamp(s, 0))
                .unwrap_or_else(Utc::now);

            CurrentConditions {
                observed_at,
                city: response.name,
                country: response.sys.country.unwrap_or_else(|| "Unknown".to_string()),
                temperature: response.main.temp,
                humidity: response.main.humidity,
                description,
                condition,
                wind_speed: response.wind.as_ref().map_or(0.0, |w| w.speed),
                wind_direction: response.wind.as_ref().and_then(|w| w.deg).unwrap_or(0),
                // Meters upstream, kilometers on the dashboard
                visibility: response.visibility.map_or(0.0, |v| v / 1000.0),
                pressure: response.main.pressure,
                sunrise: response.sys.sunrise.and_then(|s| DateTime::from_timestamp(s, 0)),
                sunset: response.sys.sunset.and_then(|s| DateTime::from_timestamp(s, 0)),
            }
        }
    }
}

/// WeatherXu-style response structures
mod weatherxu {
    use super::*;

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub success: bool,
        pub data: Option<ForecastData>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ForecastData {
        pub timezone: String,
        pub daily: Option<DailyBlock>,
    }

    #[derive(Debug, Deserialize)]
    pub struct DailyBlock {
        pub data: Vec<DailyEntry>,
    }

    /// One forecast day; all instants are epoch seconds
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DailyEntry {
        pub forecast_start: i64,
        pub sunrise_time: Option<i64>,
        pub sunset_time: Option<i64>,
        pub temperature_min: Option<f32>,
        pub temperature_max: Option<f32>,
        pub conditions: Option<String>,
    }

    impl DailyEntry {
        pub fn to_outlook(&self) -> DailyOutlook {
            DailyOutlook {
                forecast_start: DateTime::from_timestamp(self.forecast_start, 0)
                    .unwrap_or_else(Utc::now),
                temperature_min: self.temperature_min,
                temperature_max: self.temperature_max,
                conditions: self.conditions.clone(),
                sunrise: self.sunrise_time.and_then(|s| DateTime::from_timestamp(s, 0)),
                sunset: self.sunset_time.and_then(|s| DateTime::from_timestamp(s, 0)),
            }
        }
    }
}

/// Geocoding result from the geocoding API
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeocodingResult {
    /// Location name
    pub name: String,
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lon: f64,
    /// Country code
    pub country: String,
    /// State code (for US locations)
    pub state: Option<String>,
}

impl From<GeocodingResult> for Location {
    fn from(geocoding: GeocodingResult) -> Self {
        let name = if let Some(state) = geocoding.state {
            format!("{}, {}", geocoding.name, state)
        } else {
            geocoding.name
        };

        Location::with_country(geocoding.lat, geocoding.lon, name, geocoding.country)
    }
}

/// Location parsing utilities
pub struct LocationParser;

impl LocationParser {
    /// Parse location input (coordinates, city names, postal codes)
    pub fn parse(input: &str) -> Result<LocationInput> {
        let input = input.trim();

        if input.is_empty() {
            return Err(CineSkyError::validation("Location cannot be empty").into());
        }

        // Try to parse as coordinates (lat,lon)
        if let Ok(coords) = Self::parse_coordinates(input) {
            return Ok(LocationInput::Coordinates(coords.0, coords.1));
        }

        // Try to parse as postal code (numbers only or with country code)
        if Self::is_postal_code(input) {
            return Ok(LocationInput::PostalCode(input.to_string()));
        }

        // Otherwise treat as location name
        Ok(LocationInput::Name(input.to_string()))
    }

    /// Parse coordinates from string like "46.8182,8.2275" or "46.8182 8.2275"
    fn parse_coordinates(input: &str) -> Result<(f64, f64)> {
        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.len() != 2 {
            return Err(
                CineSkyError::validation("Coordinates must be in format 'lat,lon'").into(),
            );
        }

        let lat = parts[0]
            .parse::<f64>()
            .with_context(|| format!("Invalid latitude: {}", parts[0]))?;
        let lon = parts[1]
            .parse::<f64>()
            .with_context(|| format!("Invalid longitude: {}", parts[1]))?;

        // Validate coordinate ranges
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CineSkyError::validation(format!(
                "Latitude must be between -90 and 90, got: {lat}"
            ))
            .into());
        }

        if !(-180.0..=180.0).contains(&lon) {
            return Err(CineSkyError::validation(format!(
                "Longitude must be between -180 and 180, got: {lon}"
            ))
            .into());
        }

        Ok((lat, lon))
    }

    /// Check if input looks like a postal code
    fn is_postal_code(input: &str) -> bool {
        // Simple heuristic: contains mostly digits, optionally with country prefix
        let normalized = input.replace(' ', "").replace('-', "");

        // US ZIP codes: 5 or 9 digits
        if normalized.len() == 5 || normalized.len() == 9 {
            return normalized.chars().all(|c| c.is_ascii_digit());
        }

        // International postal codes: country code + digits/letters
        // Must contain at least some digits to be a postal code
        if normalized.len() >= 3 && normalized.len() <= 10 {
            let (prefix, suffix) = normalized.split_at(2);
            if prefix.chars().all(|c| c.is_ascii_alphabetic())
                && suffix.len() >= 3
                && suffix.chars().all(|c| c.is_ascii_alphanumeric())
                && suffix.chars().any(|c| c.is_ascii_digit())
            {
                return true;
            }
        }

        false
    }
}

/// Types of location input
#[derive(Debug, Clone)]
pub enum LocationInput {
    /// Coordinates (latitude, longitude)
    Coordinates(f64, f64),
    /// Location name (city, region, etc.)
    Name(String),
    /// Postal code
    PostalCode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter() {
        let mut limiter = RateLimiter::new(2);

        // Should allow first 2 requests
        assert!(limiter.allow_request());
        assert!(limiter.allow_request());

        // Should deny 3rd request
        assert!(!limiter.allow_request());

        // Check time until next request
        let wait_time = limiter.time_until_next_request();
        assert!(wait_time > Duration::from_secs(0));
    }

    #[test]
    fn test_strip_key_from_url() {
        assert_eq!(
            strip_key("https://example.com/weather?lat=1&lon=2&appid=secret"),
            "https://example.com/weather?lat=1&lon=2&"
        );
        assert_eq!(
            strip_key("https://example.com/weather?lat=1&api_key=secret"),
            "https://example.com/weather?lat=1&"
        );
        assert_eq!(strip_key("https://example.com/weather"), "https://example.com/weather");
    }

    #[test]
    fn test_location_parser_coordinates() {
        assert!(matches!(
            LocationParser::parse("46.8182,8.2275").unwrap(),
            LocationInput::Coordinates(46.8182, 8.2275)
        ));

        assert!(matches!(
            LocationParser::parse("46.8182 8.2275").unwrap(),
            LocationInput::Coordinates(46.8182, 8.2275)
        ));

        assert!(matches!(
            LocationParser::parse("-46.8182, -8.2275").unwrap(),
            LocationInput::Coordinates(-46.8182, -8.2275)
        ));
    }

    #[test]
    fn test_location_parser_invalid_coordinates() {
        // Out-of-range values are treated as location names
        assert!(matches!(
            LocationParser::parse("91.0,8.0").unwrap(),
            LocationInput::Name(_)
        ));
        assert!(matches!(
            LocationParser::parse("46.0,181.0").unwrap(),
            LocationInput::Name(_)
        ));
        assert!(matches!(
            LocationParser::parse("46.0,8.0,0.0").unwrap(),
            LocationInput::Name(_)
        ));
    }

    #[test]
    fn test_location_parser_empty_input() {
        assert!(LocationParser::parse("   ").is_err());
    }

    #[test]
    fn test_location_parser_postal_codes() {
        assert!(matches!(
            LocationParser::parse("12345").unwrap(),
            LocationInput::PostalCode(_)
        ));

        assert!(matches!(
            LocationParser::parse("CH-8001").unwrap(),
            LocationInput::PostalCode(_)
        ));
    }

    #[test]
    fn test_location_parser_names() {
        assert!(matches!(
            LocationParser::parse("Interlaken").unwrap(),
            LocationInput::Name(_)
        ));

        assert!(matches!(
            LocationParser::parse("New York City").unwrap(),
            LocationInput::Name(_)
        ));
    }

    #[test]
    fn test_geocoding_result_to_location() {
        let geocoding = GeocodingResult {
            name: "Austin".to_string(),
            lat: 30.2672,
            lon: -97.7431,
            country: "US".to_string(),
            state: Some("TX".to_string()),
        };

        let location: Location = geocoding.into();
        assert_eq!(location.name, "Austin, TX");
        assert_eq!(location.latitude, 30.2672);
        assert_eq!(location.longitude, -97.7431);
        assert_eq!(location.country, Some("US".to_string()));
    }

    #[test]
    fn test_client_builds_without_key() {
        let client = WeatherApiClient::new(CineSkyConfig::default());
        assert!(client.is_ok());
    }
}
