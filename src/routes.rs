//! API route handlers
//!
//! Everything the dashboard does maps to a handler here: auth, current
//! conditions, daily forecast, light windows, shoot planning, map
//! embeds, the saved list, history, preferences, and the contact form.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    AuthService, CineSkyConfig, CineSkyError, LocationParser, Session, WeatherApiClient, cache,
    email, light,
    light::{DayLighting, LightWindow, OffsetProfile, SolarTimes},
    location_resolver::LocationResolver,
    map,
    models::{CurrentConditions, ForecastBundle, Location},
    refresh, shoot, store,
};

/// Shared state behind every handler
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<WeatherApiClient>,
    pub auth: Arc<AuthService>,
    pub config: Arc<CineSkyConfig>,
}

impl AppState {
    pub fn new(config: CineSkyConfig) -> anyhow::Result<Self> {
        let api = Arc::new(WeatherApiClient::new(config.clone())?);
        let auth = Arc::new(AuthService::new(config.server.session_ttl_hours));
        Ok(Self {
            api,
            auth,
            config: Arc::new(config),
        })
    }
}

/// A handler failure: status code plus the user-facing banner text
pub struct ApiError(pub StatusCode, pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let status = match err.downcast_ref::<CineSkyError>() {
            Some(CineSkyError::Auth { .. }) => StatusCode::UNAUTHORIZED,
            Some(CineSkyError::Validation { .. }) => StatusCode::BAD_REQUEST,
            Some(CineSkyError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Some(CineSkyError::Api { .. }) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = err
            .downcast_ref::<CineSkyError>()
            .map(CineSkyError::user_message)
            .unwrap_or_else(|| "Something went wrong. Please try again later.".to_string());

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Unhandled error in request handler: {:#}", err);
        }

        ApiError(status, message)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth_register))
        .route("/auth/login", post(auth_login))
        .route("/auth/logout", post(auth_logout))
        .route("/auth/session", get(auth_session))
        .route("/weather/current", get(weather_current))
        .route("/weather/forecast", get(weather_forecast))
        .route("/light/windows", get(light_windows))
        .route("/shoot/plan", get(shoot_plan))
        .route("/map/embed", get(map_embed))
        .route("/list", get(list_entries).post(create_entry))
        .route("/list/{id}", axum::routing::put(update_entry).delete(delete_entry))
        .route("/history", get(history))
        .route("/prefs", get(prefs_get).put(prefs_put))
        .route("/contact", post(contact))
        .with_state(state)
}

// --- auth -----------------------------------------------------------------

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn require_session(state: &AppState, headers: &HeaderMap) -> Result<Session, ApiError> {
    let token = bearer_token(headers).ok_or_else(|| {
        ApiError(StatusCode::UNAUTHORIZED, "Please sign in to continue.".to_string())
    })?;

    state
        .auth
        .session(token)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| {
            ApiError(
                StatusCode::UNAUTHORIZED,
                "Your session has expired. Please sign in again.".to_string(),
            )
        })
}

#[derive(Deserialize)]
struct RegisterRequest {
    email: String,
    password: String,
    name: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct SessionResponse {
    token: String,
    email: String,
    display_name: String,
    expires_at: i64,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            email: session.email,
            display_name: session.display_name,
            expires_at: session.expires_at,
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "version": crate::VERSION }))
}

async fn auth_register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .auth
        .register(&request.email, &request.password, &request.name)
        .await?;
    Ok(Json(session.into()))
}

async fn auth_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.auth.login(&request.email, &request.password).await?;
    Ok(Json(session.into()))
}

async fn auth_logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let session = require_session(&state, &headers).await?;
    state.auth.logout(&session.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn auth_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = require_session(&state, &headers).await?;
    Ok(Json(session.into()))
}

// --- weather --------------------------------------------------------------

#[derive(Deserialize)]
struct WeatherQuery {
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
}

#[derive(Serialize)]
struct CurrentWeatherResponse {
    #[serde(flatten)]
    conditions: CurrentConditions,
    temperature_f: f32,
    icon: &'static str,
    wind_cardinal: &'static str,
    date_label: String,
}

impl From<CurrentConditions> for CurrentWeatherResponse {
    fn from(conditions: CurrentConditions) -> Self {
        Self {
            temperature_f: conditions.temperature_fahrenheit(),
            icon: conditions.icon(),
            wind_cardinal: CurrentConditions::wind_direction_to_cardinal(
                conditions.wind_direction,
            ),
            date_label: conditions.format_observed_date(),
            conditions,
        }
    }
}

/// Fetch current conditions for a coordinate through the cache. The TTL
/// matches the dashboard's refresh interval so a reading is never staler
/// than one refresh cycle.
async fn cached_current(state: &AppState, lat: f64, lon: f64) -> anyhow::Result<CurrentConditions> {
    let key = Location::new(lat, lon, String::new()).cache_key("current");

    if let Some(cached) = cache::get::<CurrentConditions>(&key).await? {
        return Ok(cached);
    }

    let conditions = state.api.current_conditions(lat, lon).await?;

    let ttl = cache::jittered(Duration::from_secs(
        u64::from(state.config.server.refresh_interval_minutes) * 60,
    ));
    if let Err(e) = cache::put(&key, conditions.clone(), ttl).await {
        tracing::warn!("Failed to cache current conditions: {}", e);
    }
    if let Err(e) = refresh::track(lat, lon).await {
        tracing::warn!("Failed to track location for refresh: {}", e);
    }

    Ok(conditions)
}

async fn weather_current(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<CurrentWeatherResponse>, ApiError> {
    let conditions = if let Some(city) = query.city.as_deref().filter(|c| !c.trim().is_empty()) {
        let conditions = state.api.current_conditions_by_city(city).await?;

        // A signed-in search lands in the user's history; failures here
        // never block the weather response
        if let Some(token) = bearer_token(&headers) {
            if let Ok(Some(session)) = state.auth.session(token).await {
                let label = conditions.location_label();
                let max = state.config.defaults.max_history_entries;
                if let Err(e) = store::record_search(&session.email, city, &label, max).await {
                    tracing::warn!("Failed to record search history: {}", e);
                }
            }
        }

        conditions
    } else {
        // Fall back to the configured coordinate when the client sends
        // no position (geolocation denied or unsupported)
        let lat = query.lat.unwrap_or(state.config.defaults.latitude);
        let lon = query.lon.unwrap_or(state.config.defaults.longitude);
        cached_current(&state, lat, lon).await?
    };

    Ok(Json(conditions.into()))
}

#[derive(Deserialize)]
struct ForecastQuery {
    lat: Option<f64>,
    lon: Option<f64>,
    q: Option<String>,
}

/// Turn a request's position parameters into a coordinate: a free-text
/// query is parsed and geocoded, bare coordinates pass through, and a
/// request with neither gets the configured default position.
async fn resolve_position(
    state: &AppState,
    q: Option<&str>,
    lat: Option<f64>,
    lon: Option<f64>,
) -> anyhow::Result<(f64, f64)> {
    if let Some(q) = q.filter(|q| !q.trim().is_empty()) {
        let input = LocationParser::parse(q)?;
        let location = LocationResolver::resolve_location(&state.api, input).await?;
        return Ok((location.latitude, location.longitude));
    }

    Ok((
        lat.unwrap_or(state.config.defaults.latitude),
        lon.unwrap_or(state.config.defaults.longitude),
    ))
}

/// Fetch the daily forecast through the cache
async fn cached_forecast(state: &AppState, lat: f64, lon: f64) -> anyhow::Result<ForecastBundle> {
    let key = Location::new(lat, lon, String::new()).cache_key("forecast");

    if let Some(cached) = cache::get::<ForecastBundle>(&key).await? {
        return Ok(cached);
    }

    let bundle = state.api.daily_forecast(lat, lon).await?;

    let ttl = cache::jittered(Duration::from_secs(
        u64::from(state.config.cache.ttl_hours) * 60 * 60,
    ));
    if let Err(e) = cache::put(&key, bundle.clone(), ttl).await {
        tracing::warn!("Failed to cache forecast: {}", e);
    }

    Ok(bundle)
}

async fn weather_forecast(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<ForecastBundle>, ApiError> {
    let (lat, lon) = resolve_position(&state, query.q.as_deref(), query.lat, query.lon).await?;
    let bundle = cached_forecast(&state, lat, lon).await?;
    Ok(Json(bundle))
}

// --- light windows --------------------------------------------------------

#[derive(Deserialize)]
struct LightQuery {
    lat: Option<f64>,
    lon: Option<f64>,
    q: Option<String>,
    date: Option<NaiveDate>,
    profile: Option<String>,
}

#[derive(Serialize)]
struct WindowView {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    local: String,
    duration_minutes: i64,
}

#[derive(Serialize)]
struct LightWindowsResponse {
    date: NaiveDate,
    location: String,
    timezone: String,
    available: bool,
    sunrise: Option<String>,
    sunset: Option<String>,
    morning_golden: Option<WindowView>,
    evening_golden: Option<WindowView>,
    morning_blue: Option<WindowView>,
    evening_blue: Option<WindowView>,
}

fn window_view(window: Option<LightWindow>, tz: chrono_tz::Tz) -> Option<WindowView> {
    window.map(|w| WindowView {
        start: w.start,
        end: w.end,
        local: w.format_range(tz),
        duration_minutes: w.duration_minutes(),
    })
}

/// Resolve the lighting windows for a date at a coordinate: daily
/// forecast first, locally computed solar times filling any gaps.
async fn resolve_lighting(
    state: &AppState,
    lat: f64,
    lon: f64,
    date: Option<NaiveDate>,
    profile: &OffsetProfile,
) -> anyhow::Result<(ForecastBundle, NaiveDate, DayLighting)> {
    let bundle = cached_forecast(state, lat, lon).await?;
    let tz = bundle.tz();
    let date = date.unwrap_or_else(|| Utc::now().with_timezone(&tz).date_naive());

    let from_forecast = bundle
        .day_or_first(date)
        .map(|day| day.solar_times())
        .unwrap_or_default();

    let computed = SolarTimes::compute(lat, lon, date).unwrap_or_default();
    let solar = from_forecast.or(computed);

    let lighting = DayLighting::from_solar_times(date, &solar, profile);
    Ok((bundle, date, lighting))
}

async fn light_windows(
    State(state): State<AppState>,
    Query(query): Query<LightQuery>,
) -> Result<Json<LightWindowsResponse>, ApiError> {
    let (lat, lon) = resolve_position(&state, query.q.as_deref(), query.lat, query.lon).await?;
    let profile = OffsetProfile::by_name(query.profile.as_deref().unwrap_or_default());

    let (bundle, date, lighting) = resolve_lighting(&state, lat, lon, query.date, &profile).await?;
    let tz = bundle.tz();

    Ok(Json(LightWindowsResponse {
        date,
        location: bundle.location.name.clone(),
        timezone: bundle.timezone.clone(),
        available: !lighting.is_unavailable(),
        sunrise: lighting.sunrise.map(|t| light::format_clock(t, tz)),
        sunset: lighting.sunset.map(|t| light::format_clock(t, tz)),
        morning_golden: window_view(lighting.morning_golden, tz),
        evening_golden: window_view(lighting.evening_golden, tz),
        morning_blue: window_view(lighting.morning_blue, tz),
        evening_blue: window_view(lighting.evening_blue, tz),
    }))
}

// --- shoot planning -------------------------------------------------------

#[derive(Serialize)]
struct ShootPlanResponse {
    date: NaiveDate,
    location: String,
    timezone: String,
    light_available: bool,
    morning_golden: Option<WindowView>,
    evening_golden: Option<WindowView>,
    morning_blue: Option<WindowView>,
    evening_blue: Option<WindowView>,
    camera: shoot::CameraSettings,
    light_quality: &'static str,
    visibility: &'static str,
    fog: &'static str,
    uv_index: u8,
}

async fn shoot_plan(
    State(state): State<AppState>,
    Query(query): Query<LightQuery>,
) -> Result<Json<ShootPlanResponse>, ApiError> {
    let (lat, lon) = resolve_position(&state, query.q.as_deref(), query.lat, query.lon).await?;
    let profile = OffsetProfile::by_name(query.profile.as_deref().unwrap_or_default());

    let (bundle, date, lighting) = resolve_lighting(&state, lat, lon, query.date, &profile).await?;
    let tz = bundle.tz();

    let conditions = cached_current(&state, lat, lon).await?;
    let local_hour = chrono::Timelike::hour(&Utc::now().with_timezone(&tz));

    let dew_point = shoot::approximate_dew_point(conditions.temperature, conditions.humidity);

    Ok(Json(ShootPlanResponse {
        date,
        location: bundle.location.name.clone(),
        timezone: bundle.timezone.clone(),
        light_available: !lighting.is_unavailable(),
        morning_golden: window_view(lighting.morning_golden, tz),
        evening_golden: window_view(lighting.evening_golden, tz),
        morning_blue: window_view(lighting.morning_blue, tz),
        evening_blue: window_view(lighting.evening_blue, tz),
        camera: shoot::recommended_settings(local_hour, &conditions.description),
        light_quality: shoot::light_quality(local_hour, &conditions.description),
        visibility: shoot::visibility_quality(conditions.visibility),
        fog: shoot::fog_conditions(conditions.humidity, conditions.temperature, dew_point),
        uv_index: shoot::approximate_uv_index(local_hour, &conditions.description),
    }))
}

// --- map ------------------------------------------------------------------

#[derive(Deserialize)]
struct MapQuery {
    lat: Option<f64>,
    lon: Option<f64>,
    layer: Option<String>,
}

async fn map_embed(
    State(state): State<AppState>,
    Query(query): Query<MapQuery>,
) -> Json<serde_json::Value> {
    let lat = query.lat.unwrap_or(state.config.defaults.latitude);
    let lon = query.lon.unwrap_or(state.config.defaults.longitude);
    let layer = query.layer.as_deref().unwrap_or("street");
    Json(serde_json::json!({ "url": map::embed_url(lat, lon, layer) }))
}

// --- saved list -----------------------------------------------------------

async fn list_entries(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<store::SavedEntry>>, ApiError> {
    let session = require_session(&state, &headers).await?;
    let entries = store::list_entries(&session.email).await?;
    Ok(Json(entries))
}

async fn create_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<store::SavedEntryInput>,
) -> Result<(StatusCode, Json<store::SavedEntry>), ApiError> {
    let session = require_session(&state, &headers).await?;
    let entry = store::create_entry(&session.email, input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(input): Json<store::SavedEntryInput>,
) -> Result<Json<store::SavedEntry>, ApiError> {
    let session = require_session(&state, &headers).await?;
    let entry = store::update_entry(&session.email, id, input).await?;
    Ok(Json(entry))
}

async fn delete_entry(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    let session = require_session(&state, &headers).await?;
    store::delete_entry(&session.email, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- history and preferences ----------------------------------------------

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

async fn history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<store::HistoryEntry>>, ApiError> {
    let session = require_session(&state, &headers).await?;
    let entries = store::recent_searches(&session.email, query.limit.unwrap_or(20)).await?;
    Ok(Json(entries))
}

async fn prefs_get(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<store::UserPrefs>, ApiError> {
    let session = require_session(&state, &headers).await?;
    let prefs = store::get_prefs(&session.email).await?;
    Ok(Json(prefs))
}

async fn prefs_put(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(prefs): Json<store::UserPrefs>,
) -> Result<Json<store::UserPrefs>, ApiError> {
    let session = require_session(&state, &headers).await?;
    let prefs = store::put_prefs(&session.email, prefs).await?;
    Ok(Json(prefs))
}

// --- contact --------------------------------------------------------------

#[derive(Deserialize)]
struct ContactRequest {
    name: String,
    email: String,
    message: String,
}

async fn contact(Json(request): Json<ContactRequest>) -> Result<StatusCode, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError(
            StatusCode::BAD_REQUEST,
            "Message cannot be empty.".to_string(),
        ));
    }

    email::send_contact_message(&request.name, &request.email, &request.message)
        .await
        .map_err(|e| {
            tracing::error!("Failed to send contact message: {:#}", e);
            ApiError(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not send your message. Please try again later.".to_string(),
            )
        })?;

    Ok(StatusCode::ACCEPTED)
}
