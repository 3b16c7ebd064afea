//! Map embed URL builders
//!
//! The map view has no data contract beyond a URL: a street map is an
//! OpenStreetMap export embed with a small bbox and a marker, a radar
//! view is a Windy-style embed.

/// OpenStreetMap embed URL centered on a coordinate with a ±0.1° bbox
#[must_use]
pub fn osm_embed_url(lat: f64, lon: f64) -> String {
    format!(
        "https://www.openstreetmap.org/export/embed.html?bbox={}%2C{}%2C{}%2C{}&layer=mapnik&marker={}%2C{}",
        lon - 0.1,
        lat - 0.1,
        lon + 0.1,
        lat + 0.1,
        lat,
        lon
    )
}

/// Windy-style weather-radar embed URL for a coordinate
#[must_use]
pub fn radar_embed_url(lat: f64, lon: f64) -> String {
    format!("https://embed.windy.com/embed2.html?lat={lat}&lon={lon}&zoom=8&overlay=radar")
}

/// Build the embed URL for a named layer; unknown layers get the street map
#[must_use]
pub fn embed_url(lat: f64, lon: f64, layer: &str) -> String {
    match layer {
        "radar" => radar_embed_url(lat, lon),
        _ => osm_embed_url(lat, lon),
    }
}
