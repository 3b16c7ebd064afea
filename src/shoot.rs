//! Filmmaker guidance derived from time of day and conditions
//!
//! Hour-based heuristics, not metered light: good enough to tell a crew
//! what glass and filters to bring before anyone is on location.

use serde::Serialize;

/// Recommended exposure starting point for a shoot
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct CameraSettings {
    pub aperture: &'static str,
    pub shutter_speed: &'static str,
    pub iso: &'static str,
    pub filters: Vec<&'static str>,
    pub notes: &'static str,
}

fn is_cloudy(description: &str) -> bool {
    let lower = description.to_lowercase();
    lower.contains("cloud") || lower.contains("overcast")
}

fn is_precipitating(description: &str) -> bool {
    let lower = description.to_lowercase();
    lower.contains("rain") || lower.contains("snow")
}

/// Recommended camera settings for a local hour and conditions description
#[must_use]
pub fn recommended_settings(local_hour: u32, description: &str) -> CameraSettings {
    let is_golden = (5..=8).contains(&local_hour) || (17..=19).contains(&local_hour);
    let is_blue = (4..=5).contains(&local_hour) || (19..=20).contains(&local_hour);
    let is_night = local_hour >= 20 || local_hour <= 4;

    if is_night {
        return CameraSettings {
            aperture: "f/1.4 - f/2.8",
            shutter_speed: "1/30 or slower",
            iso: "800 - 3200",
            filters: vec!["Light pollution filter"],
            notes: "Use tripod; consider long exposures for night sky/cityscapes",
        };
    }

    if is_golden {
        return CameraSettings {
            aperture: "f/2.8 - f/8",
            shutter_speed: "1/125 - 1/250",
            iso: "100 - 400",
            filters: vec!["Graduated ND filter", "Warming filter (optional)"],
            notes: "Capture warm tones and long shadows; great for silhouettes",
        };
    }

    if is_blue {
        return CameraSettings {
            aperture: "f/2.8 - f/5.6",
            shutter_speed: "1/60 - 1/125",
            iso: "400 - 800",
            filters: vec!["Cooling filter (optional)"],
            notes: "Great for city lights and blue tones; use tripod for longer exposures",
        };
    }

    if is_cloudy(description) {
        return CameraSettings {
            aperture: "f/4 - f/8",
            shutter_speed: "1/125 - 1/250",
            iso: "200 - 400",
            filters: vec!["Polarizing filter"],
            notes: "Even, diffused lighting; great for portraits and eliminating harsh shadows",
        };
    }

    CameraSettings {
        aperture: "f/8 - f/16",
        shutter_speed: "1/250 - 1/500",
        iso: "100 - 200",
        filters: vec!["Polarizing filter", "ND filter"],
        notes: "Use polarizer to reduce glare and enhance colors; ND filter to handle bright conditions",
    }
}

/// Description of the lighting quality for a local hour and conditions
#[must_use]
pub fn light_quality(local_hour: u32, description: &str) -> &'static str {
    match local_hour {
        5..=7 => {
            "Morning golden hour - soft, warm directional light with long shadows. Ideal for landscapes and portraits."
        }
        17..=19 => {
            "Evening golden hour - warm, orange-red tones with dramatic long shadows. Perfect for silhouettes and rim lighting."
        }
        20 => {
            "Blue hour - soft blue ambient light with balanced exposure between sky and artificial lights."
        }
        10..=14 if is_cloudy(description) => {
            "Overcast midday - diffused, even lighting with minimal shadows. Good for portraits and reducing contrast."
        }
        10..=14 => {
            "Harsh midday light - strong contrast and short shadows. Consider using diffusers or shooting in shade."
        }
        21..=23 | 0..=4 => {
            "Night conditions - low ambient light. Requires additional lighting or long exposure techniques."
        }
        _ => "Standard daylight - good overall lighting with moderate shadows.",
    }
}

/// How usable the visibility is for filming
#[must_use]
pub fn visibility_quality(visibility_km: f32) -> &'static str {
    if visibility_km >= 10.0 {
        "Excellent - ideal for landscape and distant shots"
    } else if visibility_km >= 5.0 {
        "Good - suitable for most outdoor filming"
    } else if visibility_km >= 2.0 {
        "Moderate - limited visibility for distant objects"
    } else {
        "Poor - consider close-up shots or using fog as an artistic element"
    }
}

/// Dew-point approximation from temperature and relative humidity
/// (the one-rule-of-thumb formula: Td ≈ T − (100 − RH) / 5)
#[must_use]
pub fn approximate_dew_point(temperature_c: f32, humidity: u8) -> f32 {
    temperature_c - (100.0 - f32::from(humidity)) / 5.0
}

/// Fog likelihood assessment for filming
#[must_use]
pub fn fog_conditions(humidity: u8, temperature_c: f32, dew_point_c: f32) -> &'static str {
    let temp_dew_point_diff = (temperature_c - dew_point_c).abs();

    if humidity > 90 && temp_dew_point_diff < 2.5 {
        "Heavy fog likely - excellent for atmospheric shots"
    } else if humidity > 80 && temp_dew_point_diff < 5.0 {
        "Light fog or mist possible - good for creating mood"
    } else {
        "Clear conditions - no fog expected"
    }
}

/// Approximate UV index (1-11) for a local hour, adjusted for conditions
#[must_use]
pub fn approximate_uv_index(local_hour: u32, description: &str) -> u8 {
    let mut uv: f32 = match local_hour {
        10..=14 => 9.0,
        8..=16 => 6.0,
        6..=18 => 3.0,
        _ => 0.0,
    };

    if is_cloudy(description) {
        uv = (uv * 0.7).floor();
    }
    if is_precipitating(description) {
        uv = (uv * 0.5).floor();
    }

    (uv as u8).clamp(1, 11)
}
