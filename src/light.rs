//! Golden-hour and blue-hour window calculation
//!
//! The windows are fixed-minute offsets from sunrise and sunset, not an
//! astronomical solar-elevation model. Sunrise/sunset normally come from
//! the daily forecast; [`SolarTimes::compute`] fills them in locally
//! when the upstream entry lacks them.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sunrise::{Coordinates, SolarDay, SolarEvent};

/// A window relative to its anchor event, in minutes.
/// Negative offsets reach before the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub start_offset_min: i64,
    pub end_offset_min: i64,
}

impl WindowSpec {
    const fn new(start_offset_min: i64, end_offset_min: i64) -> Self {
        Self {
            start_offset_min,
            end_offset_min,
        }
    }

    fn apply(&self, anchor: DateTime<Utc>) -> LightWindow {
        LightWindow {
            start: anchor + Duration::minutes(self.start_offset_min),
            end: anchor + Duration::minutes(self.end_offset_min),
        }
    }
}

/// One named set of window offsets. The duplicated upstream
/// implementations disagreed on the golden-hour spans; both observed
/// rule sets are kept as selectable profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetProfile {
    /// Morning golden hour, anchored on sunrise
    pub morning_golden: WindowSpec,
    /// Evening golden hour, anchored on sunset
    pub evening_golden: WindowSpec,
    /// Morning blue hour, anchored on sunrise
    pub morning_blue: WindowSpec,
    /// Evening blue hour, anchored on sunset
    pub evening_blue: WindowSpec,
}

impl OffsetProfile {
    /// Primary rule set: golden hour is the hour after sunrise and the
    /// hour before sunset; blue hour the half hour before sunrise and
    /// after sunset.
    pub const STANDARD: OffsetProfile = OffsetProfile {
        morning_golden: WindowSpec::new(0, 60),
        evening_golden: WindowSpec::new(-60, 0),
        morning_blue: WindowSpec::new(-30, 0),
        evening_blue: WindowSpec::new(0, 30),
    };

    /// Alternate rule set: golden hour straddles sunrise (-30/+40) and
    /// ends at sunset (-40/0); blue hours as in the primary set.
    pub const COMPACT: OffsetProfile = OffsetProfile {
        morning_golden: WindowSpec::new(-30, 40),
        evening_golden: WindowSpec::new(-40, 0),
        morning_blue: WindowSpec::new(-30, 0),
        evening_blue: WindowSpec::new(0, 30),
    };

    /// Look up a profile by name; unknown names select the standard one.
    #[must_use]
    pub fn by_name(name: &str) -> OffsetProfile {
        match name {
            "compact" => Self::COMPACT,
            _ => Self::STANDARD,
        }
    }
}

/// A concrete start/end instant pair
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct LightWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl LightWindow {
    /// Window length in minutes
    #[must_use]
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Whether an instant falls inside the window (inclusive bounds)
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    /// Render as local clock times, "6:00 AM - 7:00 AM"
    #[must_use]
    pub fn format_range(&self, tz: Tz) -> String {
        format!("{} - {}", format_clock(self.start, tz), format_clock(self.end, tz))
    }
}

/// Render an instant as a 12-hour local clock time ("5:30 AM")
#[must_use]
pub fn format_clock(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%-I:%M %p").to_string()
}

/// Sunrise and sunset for one day. Either may be absent: the upstream
/// forecast can omit them, and polar day/night has no event at all.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default)]
pub struct SolarTimes {
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}

impl SolarTimes {
    /// Compute sunrise/sunset locally for a coordinate and date.
    /// Polar day/night yields `None` for the missing event.
    pub fn compute(latitude: f64, longitude: f64, date: NaiveDate) -> Result<SolarTimes> {
        let coordinates = Coordinates::new(latitude, longitude).with_context(|| {
            format!("Invalid coordinates: lat={latitude}, lng={longitude}")
        })?;

        let solar_day = SolarDay::new(coordinates, date);

        Ok(SolarTimes {
            sunrise: solar_day.event_time(SolarEvent::Sunrise),
            sunset: solar_day.event_time(SolarEvent::Sunset),
        })
    }

    /// True when both events are known
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.sunrise.is_some() && self.sunset.is_some()
    }

    /// Fill in missing events from another source, keeping existing ones
    #[must_use]
    pub fn or(self, fallback: SolarTimes) -> SolarTimes {
        SolarTimes {
            sunrise: self.sunrise.or(fallback.sunrise),
            sunset: self.sunset.or(fallback.sunset),
        }
    }
}

/// The four lighting windows for one day. Windows whose anchor event is
/// unknown are `None`; all four `None` is the explicit "unavailable"
/// state the dashboard shows for missing solar data.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct DayLighting {
    pub date: NaiveDate,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub morning_golden: Option<LightWindow>,
    pub evening_golden: Option<LightWindow>,
    pub morning_blue: Option<LightWindow>,
    pub evening_blue: Option<LightWindow>,
}

impl DayLighting {
    /// Derive the four windows from a day's solar times
    #[must_use]
    pub fn from_solar_times(date: NaiveDate, solar: &SolarTimes, profile: &OffsetProfile) -> Self {
        Self {
            date,
            sunrise: solar.sunrise,
            sunset: solar.sunset,
            morning_golden: solar.sunrise.map(|t| profile.morning_golden.apply(t)),
            evening_golden: solar.sunset.map(|t| profile.evening_golden.apply(t)),
            morning_blue: solar.sunrise.map(|t| profile.morning_blue.apply(t)),
            evening_blue: solar.sunset.map(|t| profile.evening_blue.apply(t)),
        }
    }

    /// True when no window could be derived
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        self.morning_golden.is_none()
            && self.evening_golden.is_none()
            && self.morning_blue.is_none()
            && self.evening_blue.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn solar(date: (i32, u32, u32), rise: (u32, u32), set: (u32, u32)) -> SolarTimes {
        SolarTimes {
            sunrise: Some(
                Utc.with_ymd_and_hms(date.0, date.1, date.2, rise.0, rise.1, 0)
                    .unwrap(),
            ),
            sunset: Some(
                Utc.with_ymd_and_hms(date.0, date.1, date.2, set.0, set.1, 0)
                    .unwrap(),
            ),
        }
    }

    #[test]
    fn test_standard_profile_windows() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let lighting =
            DayLighting::from_solar_times(date, &solar((2026, 6, 15), (6, 0), (18, 0)), &OffsetProfile::STANDARD);

        let mg = lighting.morning_golden.unwrap();
        assert_eq!(mg.start, Utc.with_ymd_and_hms(2026, 6, 15, 6, 0, 0).unwrap());
        assert_eq!(mg.end, Utc.with_ymd_and_hms(2026, 6, 15, 7, 0, 0).unwrap());

        let eg = lighting.evening_golden.unwrap();
        assert_eq!(eg.start, Utc.with_ymd_and_hms(2026, 6, 15, 17, 0, 0).unwrap());
        assert_eq!(eg.end, Utc.with_ymd_and_hms(2026, 6, 15, 18, 0, 0).unwrap());

        let mb = lighting.morning_blue.unwrap();
        assert_eq!(mb.start, Utc.with_ymd_and_hms(2026, 6, 15, 5, 30, 0).unwrap());
        assert_eq!(mb.end, Utc.with_ymd_and_hms(2026, 6, 15, 6, 0, 0).unwrap());

        let eb = lighting.evening_blue.unwrap();
        assert_eq!(eb.start, Utc.with_ymd_and_hms(2026, 6, 15, 18, 0, 0).unwrap());
        assert_eq!(eb.end, Utc.with_ymd_and_hms(2026, 6, 15, 18, 30, 0).unwrap());
    }

    #[test]
    fn test_compact_profile_windows() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let lighting =
            DayLighting::from_solar_times(date, &solar((2026, 6, 15), (6, 0), (18, 0)), &OffsetProfile::COMPACT);

        let mg = lighting.morning_golden.unwrap();
        assert_eq!(mg.start, Utc.with_ymd_and_hms(2026, 6, 15, 5, 30, 0).unwrap());
        assert_eq!(mg.end, Utc.with_ymd_and_hms(2026, 6, 15, 6, 40, 0).unwrap());
        assert_eq!(mg.duration_minutes(), 70);

        let eg = lighting.evening_golden.unwrap();
        assert_eq!(eg.start, Utc.with_ymd_and_hms(2026, 6, 15, 17, 20, 0).unwrap());
        assert_eq!(eg.duration_minutes(), 40);
    }

    #[test]
    fn test_missing_sunrise_leaves_morning_windows_unset() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let solar = SolarTimes {
            sunrise: None,
            sunset: Some(Utc.with_ymd_and_hms(2026, 6, 15, 18, 0, 0).unwrap()),
        };
        let lighting = DayLighting::from_solar_times(date, &solar, &OffsetProfile::STANDARD);
        assert!(lighting.morning_golden.is_none());
        assert!(lighting.morning_blue.is_none());
        assert!(lighting.evening_golden.is_some());
        assert!(!lighting.is_unavailable());
    }

    #[test]
    fn test_fully_missing_solar_data_is_unavailable() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let lighting =
            DayLighting::from_solar_times(date, &SolarTimes::default(), &OffsetProfile::STANDARD);
        assert!(lighting.is_unavailable());
    }

    #[test]
    fn test_midnight_rollover() {
        // Sunset 23:40 on New Year's Eve: evening blue hour ends 00:10 on Jan 1
        let date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        let solar = SolarTimes {
            sunrise: None,
            sunset: Some(Utc.with_ymd_and_hms(2025, 12, 31, 23, 40, 0).unwrap()),
        };
        let lighting = DayLighting::from_solar_times(date, &solar, &OffsetProfile::STANDARD);
        let eb = lighting.evening_blue.unwrap();
        assert_eq!(eb.end, Utc.with_ymd_and_hms(2026, 1, 1, 0, 10, 0).unwrap());
    }

    #[test]
    fn test_window_contains() {
        let window = LightWindow {
            start: Utc.with_ymd_and_hms(2026, 6, 15, 6, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2026, 6, 15, 7, 0, 0).unwrap(),
        };
        assert!(window.contains(Utc.with_ymd_and_hms(2026, 6, 15, 6, 30, 0).unwrap()));
        assert!(window.contains(window.start));
        assert!(!window.contains(Utc.with_ymd_and_hms(2026, 6, 15, 7, 1, 0).unwrap()));
    }

    #[test]
    fn test_format_clock_is_twelve_hour() {
        let instant = Utc.with_ymd_and_hms(2026, 6, 15, 17, 5, 0).unwrap();
        assert_eq!(format_clock(instant, chrono_tz::UTC), "5:05 PM");
        // Midnight renders as 12, not 0
        let midnight = Utc.with_ymd_and_hms(2026, 6, 15, 0, 10, 0).unwrap();
        assert_eq!(format_clock(midnight, chrono_tz::UTC), "12:10 AM");
    }

    #[test]
    fn test_solar_times_or_fills_gaps() {
        let partial = SolarTimes {
            sunrise: Some(Utc.with_ymd_and_hms(2026, 6, 15, 6, 0, 0).unwrap()),
            sunset: None,
        };
        let fallback = solar((2026, 6, 15), (5, 50), (18, 10));
        let merged = partial.or(fallback);
        // Existing sunrise wins, missing sunset is filled
        assert_eq!(merged.sunrise, partial.sunrise);
        assert_eq!(merged.sunset, fallback.sunset);
        assert!(merged.is_complete());
    }

    #[test]
    fn test_compute_rejects_invalid_coordinates() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        assert!(SolarTimes::compute(123.0, 8.2, date).is_err());
    }

    #[test]
    fn test_compute_mid_latitude_has_both_events() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let solar = SolarTimes::compute(52.52, 13.40, date).unwrap();
        assert!(solar.is_complete());
    }
}
