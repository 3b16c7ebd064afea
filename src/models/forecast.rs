//! Daily forecast model and date selection

use super::Location;
use crate::light::SolarTimes;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// One day of the upstream daily forecast
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DailyOutlook {
    /// Instant the forecast day starts at
    pub forecast_start: DateTime<Utc>,
    /// Minimum temperature in Celsius
    pub temperature_min: Option<f32>,
    /// Maximum temperature in Celsius
    pub temperature_max: Option<f32>,
    /// Human-readable conditions summary
    pub conditions: Option<String>,
    /// Sunrise instant, when the upstream entry carried one
    pub sunrise: Option<DateTime<Utc>>,
    /// Sunset instant, when the upstream entry carried one
    pub sunset: Option<DateTime<Utc>>,
}

impl DailyOutlook {
    /// Sunrise/sunset pair for this day
    #[must_use]
    pub fn solar_times(&self) -> SolarTimes {
        SolarTimes {
            sunrise: self.sunrise,
            sunset: self.sunset,
        }
    }
}

/// Daily forecast for a location
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ForecastBundle {
    /// Location for this forecast
    pub location: Location,
    /// IANA timezone identifier reported by the upstream service
    pub timezone: String,
    /// One entry per forecast day, sorted by start instant
    pub days: Vec<DailyOutlook>,
    /// When this forecast was retrieved
    pub retrieved_at: DateTime<Utc>,
}

impl ForecastBundle {
    /// Create a new forecast bundle
    #[must_use]
    pub fn new(location: Location, timezone: String, days: Vec<DailyOutlook>) -> Self {
        Self {
            location,
            timezone,
            days,
            retrieved_at: Utc::now(),
        }
    }

    /// The bundle's timezone, falling back to UTC when the upstream
    /// identifier does not parse
    #[must_use]
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }

    /// Find the entry whose forecast day matches `date` in the bundle's
    /// timezone
    #[must_use]
    pub fn day_for(&self, date: NaiveDate) -> Option<&DailyOutlook> {
        let tz = self.tz();
        self.days
            .iter()
            .find(|day| day.forecast_start.with_timezone(&tz).date_naive() == date)
    }

    /// Entry for `date`, or the first entry when the date is not covered.
    /// Returns `None` only for an empty forecast.
    #[must_use]
    pub fn day_or_first(&self, date: NaiveDate) -> Option<&DailyOutlook> {
        self.day_for(date).or_else(|| self.days.first())
    }

    /// Check if forecast data is still fresh (not older than cache TTL)
    #[must_use]
    pub fn is_fresh(&self, ttl_hours: u32) -> bool {
        let age = Utc::now() - self.retrieved_at;
        age.num_hours() < i64::from(ttl_hours)
    }
}
