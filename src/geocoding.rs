//! Place name to coordinates resolution
//!
//! Lookups go to the Open-Meteo geocoding API. A failed lookup is never an
//! error for callers of [`Geocoder::geocode`]: time-outs, an unreachable
//! service and unknown places are logged differently, then all collapse
//! into `None`.

use crate::models::Coordinates;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Why a place could not be resolved
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeocodeMiss {
    #[error("geocoding timed out")]
    TimedOut,
    #[error("geocoding service unavailable: {0}")]
    Unavailable(String),
    #[error("no matching location")]
    NoMatch,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve `place`, reporting why it failed
    async fn lookup(&self, place: &str) -> std::result::Result<Coordinates, GeocodeMiss>;

    /// Resolve `place`, absorbing every failure into `None`
    async fn geocode(&self, place: &str) -> Option<Coordinates> {
        match self.lookup(place).await {
            Ok(coordinates) => Some(coordinates),
            Err(GeocodeMiss::TimedOut) => {
                warn!("Geocoding timed out for {}", place);
                None
            }
            Err(GeocodeMiss::Unavailable(reason)) => {
                warn!("Geocoding service unavailable for {}: {}", place, reason);
                None
            }
            Err(GeocodeMiss::NoMatch) => {
                warn!("No location found for {}", place);
                None
            }
        }
    }
}

/// Geocoding response from `OpenMeteo`
#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
}

/// `OpenMeteo` geocoding client; one request per lookup, no retries
pub struct OpenMeteoGeocoder {
    client: Client,
    base_url: String,
}

impl OpenMeteoGeocoder {
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
impl Geocoder for OpenMeteoGeocoder {
    #[instrument(skip(self))]
    async fn lookup(&self, place: &str) -> std::result::Result<Coordinates, GeocodeMiss> {
        let place = place.trim();
        if place.is_empty() {
            return Err(GeocodeMiss::NoMatch);
        }

        let start_time = Instant::now();
        let url = format!(
            "{}/search?name={}&count=1&language=en&format=json",
            self.base_url,
            urlencoding::encode(place)
        );
        debug!("Geocoding request URL: {}", url);

        let response = self.client.get(&url).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeMiss::Unavailable(format!("HTTP {status}")));
        }

        let body: GeocodingResponse = response.json().await.map_err(classify)?;

        let best = body
            .results
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or(GeocodeMiss::NoMatch)?;

        info!(
            "Geocoded '{}' to {} ({}) at ({:.4}, {:.4}) in {:.3}s",
            place,
            best.name,
            best.country.as_deref().unwrap_or("Unknown"),
            best.latitude,
            best.longitude,
            start_time.elapsed().as_secs_f64()
        );

        Ok(Coordinates::new(best.latitude, best.longitude))
    }
}

fn classify(err: reqwest::Error) -> GeocodeMiss {
    if err.is_timeout() {
        GeocodeMiss::TimedOut
    } else {
        GeocodeMiss::Unavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(std::result::Result<Coordinates, GeocodeMiss>);

    #[async_trait]
    impl Geocoder for Fixed {
        async fn lookup(&self, _place: &str) -> std::result::Result<Coordinates, GeocodeMiss> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn test_every_miss_collapses_to_none() {
        for miss in [
            GeocodeMiss::TimedOut,
            GeocodeMiss::Unavailable("HTTP 503".to_string()),
            GeocodeMiss::NoMatch,
        ] {
            assert_eq!(Fixed(Err(miss)).geocode("Atlantis").await, None);
        }
    }

    #[tokio::test]
    async fn test_hit_passes_through() {
        let london = Coordinates::new(51.5074, -0.1278);
        assert_eq!(Fixed(Ok(london)).geocode("London").await, Some(london));
    }

    #[tokio::test]
    async fn test_blank_place_needs_no_network() {
        // Nothing listens on the discard port; a request would fail as Unavailable.
        let geocoder =
            OpenMeteoGeocoder::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        assert_eq!(geocoder.lookup("   ").await, Err(GeocodeMiss::NoMatch));
        assert_eq!(geocoder.geocode("").await, None);
    }
}
