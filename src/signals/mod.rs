//! External signal adapter: tariff and outdoor temperature inputs.
//!
//! Sources are best-effort. A failed or malformed reading is logged by the
//! engine and the previous value stays in place.

pub mod drift;
#[cfg(feature = "feeds")]
pub mod http;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Which simulation input a reading feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// Electricity tariff (currency/kWh).
    Tariff,
    /// Outdoor temperature (°C).
    OutdoorTemp,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Tariff => f.write_str("tariff"),
            SignalKind::OutdoorTemp => f.write_str("outdoor temperature"),
        }
    }
}

/// An external fetch that did not produce a usable value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    /// The request could not be sent or the body could not be read.
    #[error("transport error: {0}")]
    Transport(String),
    /// The service answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(u16),
    /// The body did not contain the expected value.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Boxed future returned by [`SignalSource::fetch`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<f64, SignalError>> + Send + 'a>>;

/// A periodically polled provider of one simulation input.
pub trait SignalSource: Send + Sync {
    /// Input this source feeds.
    fn kind(&self) -> SignalKind;

    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Fetches the current value, already converted to simulation units.
    fn fetch(&self) -> FetchFuture<'_>;
}

/// A source together with its polling period.
pub struct ScheduledSource {
    /// The source to poll.
    pub source: Box<dyn SignalSource>,
    /// Time between polls.
    pub every: Duration,
}

impl ScheduledSource {
    /// Pairs `source` with a polling period.
    pub fn new(source: impl SignalSource + 'static, every: Duration) -> Self {
        Self {
            source: Box::new(source),
            every,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CarbonIntensityPayload {
    carbon_intensity: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelinePayload {
    current_conditions: Option<CurrentConditions>,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temp: Option<f64>,
}

/// Extracts `carbonIntensity` from a carbon-intensity feed response.
///
/// # Errors
///
/// Returns [`SignalError::Malformed`] for invalid JSON, a missing field,
/// or a value that is not strictly positive.
pub fn parse_carbon_intensity(body: &str) -> Result<f64, SignalError> {
    let payload: CarbonIntensityPayload =
        serde_json::from_str(body).map_err(|e| SignalError::Malformed(e.to_string()))?;
    match payload.carbon_intensity {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        Some(v) => Err(SignalError::Malformed(format!(
            "carbonIntensity {v} is not positive"
        ))),
        None => Err(SignalError::Malformed("missing carbonIntensity".into())),
    }
}

/// Converts a carbon intensity into a tariff, rounded to two decimals.
///
/// # Examples
///
/// ```
/// use household_sim::signals::tariff_from_intensity;
///
/// assert_eq!(tariff_from_intensity(632.0, 0.01), 6.32);
/// ```
pub fn tariff_from_intensity(intensity: f64, factor: f64) -> f64 {
    (intensity * factor * 100.0).round() / 100.0
}

/// Extracts `currentConditions.temp` from a weather timeline response.
///
/// # Errors
///
/// Returns [`SignalError::Malformed`] for invalid JSON, a missing field,
/// or a non-finite temperature.
pub fn parse_current_temp(body: &str) -> Result<f64, SignalError> {
    let payload: TimelinePayload =
        serde_json::from_str(body).map_err(|e| SignalError::Malformed(e.to_string()))?;
    match payload.current_conditions.and_then(|c| c.temp) {
        Some(t) if t.is_finite() => Ok(t),
        Some(t) => Err(SignalError::Malformed(format!("temperature {t} is not finite"))),
        None => Err(SignalError::Malformed(
            "missing currentConditions.temp".into(),
        )),
    }
}
