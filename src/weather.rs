//! Destination weather for the travel date
//!
//! [`WeatherProvider::get_daily_forecast`] always returns a value: any
//! failure turns into [`WeatherForecast::unavailable`], so callers only need
//! a sentinel check.

use crate::models::{Coordinates, UNAVAILABLE_WEATHER_CODE, WeatherForecast};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetch the forecast for `date`, surfacing failures
    async fn fetch_daily(&self, coordinates: Coordinates, date: NaiveDate)
    -> Result<WeatherForecast>;

    /// Fetch the forecast for `date`, or the sentinel on any failure
    async fn get_daily_forecast(&self, coordinates: Coordinates, date: NaiveDate) -> WeatherForecast {
        match self.fetch_daily(coordinates, date).await {
            Ok(forecast) if forecast.weather_code != UNAVAILABLE_WEATHER_CODE => forecast,
            Ok(_) => {
                warn!("Weather service returned the reserved code for {}", date);
                WeatherForecast::unavailable()
            }
            Err(e) => {
                warn!("Could not fetch weather data: {:#}", e);
                WeatherForecast::unavailable()
            }
        }
    }
}

/// Daily forecast response from `OpenMeteo`
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: Option<DailyData>,
}

/// Daily weather data from `OpenMeteo`
#[derive(Debug, Deserialize)]
struct DailyData {
    time: Vec<String>,
    #[serde(rename = "temperature_2m_max")]
    temperature_max: Option<Vec<Option<f64>>>,
    #[serde(rename = "temperature_2m_min")]
    temperature_min: Option<Vec<Option<f64>>>,
    #[serde(rename = "weathercode")]
    weather_code: Option<Vec<Option<f64>>>,
}

impl DailyData {
    fn forecast_for(&self, date: &str) -> Result<WeatherForecast> {
        let index = self
            .time
            .iter()
            .position(|day| day == date)
            .ok_or_else(|| anyhow!("No daily entry for {date}"))?;

        let value = |series: &Option<Vec<Option<f64>>>, name: &str| {
            series
                .as_ref()
                .and_then(|values| values.get(index).copied().flatten())
                .ok_or_else(|| anyhow!("Missing {name} for {date}"))
        };

        let max_temp = value(&self.temperature_max, "temperature_2m_max")?;
        let min_temp = value(&self.temperature_min, "temperature_2m_min")?;
        let code = value(&self.weather_code, "weathercode")?;

        if !(0.0..=99.0).contains(&code) {
            bail!("Weather code {code} is outside the WMO range");
        }

        Ok(WeatherForecast::new(max_temp, min_temp, code as i32))
    }
}

/// `OpenMeteo` forecast client; one request per lookup, no retries
pub struct OpenMeteoWeather {
    client: Client,
    base_url: String,
}

impl OpenMeteoWeather {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tripplanner/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoWeather {
    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    async fn fetch_daily(
        &self,
        coordinates: Coordinates,
        date: NaiveDate,
    ) -> Result<WeatherForecast> {
        let start_time = Instant::now();
        let day = date.format("%Y-%m-%d").to_string();

        // timezone=auto resolves the day boundary in the destination's local time
        let url = format!(
            "{}/forecast?latitude={}&longitude={}&daily=temperature_2m_max,temperature_2m_min,weathercode&timezone=auto&start_date={day}&end_date={day}",
            self.base_url, coordinates.latitude, coordinates.longitude
        );
        debug!("OpenMeteo API request URL: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| "Weather request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Weather API request failed with status: {status}");
        }

        let body: ForecastResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse OpenMeteo forecast response")?;

        let forecast = body
            .daily
            .ok_or_else(|| anyhow!("Response has no daily section"))?
            .forecast_for(&day)?;

        info!(
            "Retrieved forecast for {} ({}) in {:.3}s",
            day,
            forecast.description(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(forecast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daily(json: serde_json::Value) -> DailyData {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_forecast_for_matching_day() {
        let data = daily(serde_json::json!({
            "time": ["2026-10-17"],
            "temperature_2m_max": [14.2],
            "temperature_2m_min": [7.9],
            "weathercode": [61]
        }));
        let forecast = data.forecast_for("2026-10-17").unwrap();
        assert_eq!(forecast, WeatherForecast::new(14.2, 7.9, 61));
        assert_eq!(forecast.description(), "Slight rain");
    }

    #[test]
    fn test_forecast_missing_values_is_error() {
        let data = daily(serde_json::json!({
            "time": ["2026-10-17"],
            "temperature_2m_max": [null],
            "temperature_2m_min": [7.9],
            "weathercode": [3]
        }));
        assert!(data.forecast_for("2026-10-17").is_err());
    }

    #[test]
    fn test_forecast_other_day_is_error() {
        let data = daily(serde_json::json!({
            "time": ["2026-10-18"],
            "temperature_2m_max": [14.2],
            "temperature_2m_min": [7.9],
            "weathercode": [3]
        }));
        assert!(data.forecast_for("2026-10-17").is_err());
    }

    #[test]
    fn test_negative_code_is_error() {
        let data = daily(serde_json::json!({
            "time": ["2026-10-17"],
            "temperature_2m_max": [14.2],
            "temperature_2m_min": [7.9],
            "weathercode": [-1]
        }));
        assert!(data.forecast_for("2026-10-17").is_err());
    }

    struct Failing;

    #[async_trait]
    impl WeatherProvider for Failing {
        async fn fetch_daily(&self, _: Coordinates, _: NaiveDate) -> Result<WeatherForecast> {
            Err(anyhow!("connection refused"))
        }
    }

    #[tokio::test]
    async fn test_failure_yields_sentinel() {
        let forecast = Failing
            .get_daily_forecast(
                Coordinates::new(51.5, -0.12),
                NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
            )
            .await;
        assert_eq!(forecast, WeatherForecast::new(0.0, 0.0, -1));
    }
}
