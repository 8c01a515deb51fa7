//! HTTP-backed signal sources (feature `feeds`).

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, error};

use super::{
    FetchFuture, SignalError, SignalKind, SignalSource, parse_carbon_intensity,
    parse_current_temp, tariff_from_intensity,
};

/// Default carbon-intensity endpoint.
pub const CARBON_INTENSITY_URL: &str = "https://api.electricitymap.org/v3/carbon-intensity/latest";
/// Default weather timeline endpoint.
pub const WEATHER_TIMELINE_URL: &str =
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

fn build_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_default()
}

async fn get_body(request: reqwest::RequestBuilder, source: &str) -> Result<String, SignalError> {
    let response = request
        .send()
        .await
        .map_err(|e| SignalError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        error!(source, %status, "signal endpoint returned error status");
        return Err(SignalError::Status(status.as_u16()));
    }

    response
        .text()
        .await
        .map_err(|e| SignalError::Transport(e.to_string()))
}

/// Tariff derived from a carbon-intensity feed for one grid zone.
pub struct CarbonIntensityFeed {
    client: Client,
    url: String,
    zone: String,
    auth_token: Option<String>,
    intensity_factor: f64,
}

impl CarbonIntensityFeed {
    /// Creates a feed client.
    ///
    /// # Arguments
    ///
    /// * `url` - Latest-intensity endpoint
    /// * `zone` - Grid zone code, sent as the `zone` query parameter
    /// * `auth_token` - Sent in the `auth-token` header when present
    /// * `intensity_factor` - Multiplier from intensity to tariff
    pub fn new(
        url: impl Into<String>,
        zone: impl Into<String>,
        auth_token: Option<String>,
        intensity_factor: f64,
    ) -> Self {
        Self {
            client: build_client(),
            url: url.into(),
            zone: zone.into(),
            auth_token,
            intensity_factor,
        }
    }

    async fn fetch_tariff(&self) -> Result<f64, SignalError> {
        debug!(url = %self.url, zone = %self.zone, "fetching carbon intensity");
        let mut request = self
            .client
            .get(&self.url)
            .query(&[("zone", self.zone.as_str())]);
        if let Some(token) = &self.auth_token {
            request = request.header("auth-token", token);
        }
        let body = get_body(request, self.name()).await?;
        let intensity = parse_carbon_intensity(&body)?;
        Ok(tariff_from_intensity(intensity, self.intensity_factor))
    }
}

impl SignalSource for CarbonIntensityFeed {
    fn kind(&self) -> SignalKind {
        SignalKind::Tariff
    }

    fn name(&self) -> &str {
        "carbon-intensity"
    }

    fn fetch(&self) -> FetchFuture<'_> {
        Box::pin(self.fetch_tariff())
    }
}

/// Current outdoor temperature from a weather timeline service.
pub struct TimelineWeather {
    client: Client,
    base_url: String,
    location: String,
    api_key: Option<String>,
}

impl TimelineWeather {
    /// Creates a weather client for `location` (e.g. `"Mumbai,IN"`).
    pub fn new(
        base_url: impl Into<String>,
        location: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into(),
            location: location.into(),
            api_key,
        }
    }

    fn request_url(&self) -> String {
        format!(
            "{}/{}/today",
            self.base_url.trim_end_matches('/'),
            self.location
        )
    }

    async fn fetch_temp(&self) -> Result<f64, SignalError> {
        let url = self.request_url();
        debug!(%url, "fetching current weather");
        let mut request = self
            .client
            .get(&url)
            .query(&[("unitGroup", "metric"), ("include", "current")]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }
        let body = get_body(request, self.name()).await?;
        parse_current_temp(&body)
    }
}

impl SignalSource for TimelineWeather {
    fn kind(&self) -> SignalKind {
        SignalKind::OutdoorTemp
    }

    fn name(&self) -> &str {
        "weather-timeline"
    }

    fn fetch(&self) -> FetchFuture<'_> {
        Box::pin(self.fetch_temp())
    }
}
