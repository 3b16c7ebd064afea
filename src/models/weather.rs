//! Current-conditions model and display methods

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single weather reading for a location, as shown on the dashboard
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CurrentConditions {
    /// When this reading was observed
    pub observed_at: DateTime<Utc>,
    /// City name reported by the upstream service
    pub city: String,
    /// Country code (ISO 3166-1 alpha-2)
    pub country: String,
    /// Temperature in Celsius
    pub temperature: f32,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Human-readable description of conditions ("light rain")
    pub description: String,
    /// Condition group ("Rain", "Clouds", ...)
    pub condition: String,
    /// Wind speed in m/s
    pub wind_speed: f32,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction: u16,
    /// Visibility in kilometers
    pub visibility: f32,
    /// Atmospheric pressure in hPa
    pub pressure: f32,
    /// Sunrise instant, when the upstream response carried one
    pub sunrise: Option<DateTime<Utc>>,
    /// Sunset instant, when the upstream response carried one
    pub sunset: Option<DateTime<Utc>>,
}

impl CurrentConditions {
    /// Temperature converted to Fahrenheit
    #[must_use]
    pub fn temperature_fahrenheit(&self) -> f32 {
        self.temperature * 1.8 + 32.0
    }

    /// Combined display label ("Berlin, DE")
    #[must_use]
    pub fn location_label(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }

    /// Convert wind direction from degrees to cardinal direction
    #[must_use]
    pub fn wind_direction_to_cardinal(degrees: u16) -> &'static str {
        match degrees {
            0..=11 | 349..=360 => "N",
            12..=33 => "NNE",
            34..=56 => "NE",
            57..=78 => "ENE",
            79..=101 => "E",
            102..=123 => "ESE",
            124..=146 => "SE",
            147..=168 => "SSE",
            169..=191 => "S",
            192..=213 => "SSW",
            214..=236 => "SW",
            237..=258 => "WSW",
            259..=281 => "W",
            282..=303 => "WNW",
            304..=326 => "NW",
            327..=348 => "NNW",
            _ => "Unknown",
        }
    }

    /// Display icon identifier for a condition group
    #[must_use]
    pub fn icon_for_condition(condition: &str) -> &'static str {
        match condition {
            "Haze" => "CLEAR_DAY",
            "Clouds" => "CLOUDY",
            "Rain" => "RAIN",
            "Snow" => "SNOW",
            "Dust" => "WIND",
            "Drizzle" => "SLEET",
            "Fog" | "Smoke" => "FOG",
            "Tornado" => "WIND",
            _ => "CLEAR_DAY",
        }
    }

    /// Icon identifier for this reading
    #[must_use]
    pub fn icon(&self) -> &'static str {
        Self::icon_for_condition(&self.condition)
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature)
    }

    /// Format wind information
    #[must_use]
    pub fn format_wind(&self) -> String {
        let direction = Self::wind_direction_to_cardinal(self.wind_direction);
        format!("{:.1} m/s {}", self.wind_speed, direction)
    }

    /// Format the observation date the way the dashboard header shows it
    /// ("Friday, 5 June 2026")
    #[must_use]
    pub fn format_observed_date(&self) -> String {
        self.observed_at.format("%A, %-d %B %Y").to_string()
    }
}
