//! Trip planning workflow
//!
//! One submission runs start to finish: validate, convert the budget,
//! generate the itinerary, fetch destination weather, geocode the source,
//! render the map. Only itinerary generation can fail the run; every later
//! step degrades to a notice instead.

use crate::config::TripPlannerConfig;
use crate::currency::{self, CurrencyConverter};
use crate::geocoding::{Geocoder, OpenMeteoGeocoder};
use crate::itinerary::{GeminiClient, ItineraryGenerator, compose_prompt};
use crate::map::{MapRenderer, MapView};
use crate::models::{DownloadArtifact, ItineraryResult, TripRequest, WeatherForecast};
use crate::weather::{OpenMeteoWeather, WeatherProvider};
use crate::{Result, TripPlannerError};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Steps of one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlanningStage {
    Idle,
    Validating,
    Converting,
    GeneratingItinerary,
    FetchingWeather,
    Geocoding,
    Rendering,
    Complete,
    Failed,
}

impl PlanningStage {
    /// Whether `next` may follow `self`
    #[must_use]
    pub fn can_transition_to(self, next: PlanningStage) -> bool {
        use PlanningStage::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Idle)
                | (Validating, Converting)
                | (Converting, GeneratingItinerary)
                | (GeneratingItinerary, FetchingWeather)
                | (GeneratingItinerary, Failed)
                | (FetchingWeather, Geocoding)
                | (Geocoding, Rendering)
                | (Rendering, Complete)
        )
    }
}

/// Tracks the stage of a single run; discarded afterwards
struct Submission {
    stage: PlanningStage,
}

impl Submission {
    fn new() -> Self {
        Self {
            stage: PlanningStage::Idle,
        }
    }

    fn advance(&mut self, next: PlanningStage) {
        debug_assert!(
            self.stage.can_transition_to(next),
            "invalid transition {:?} -> {:?}",
            self.stage,
            next
        );
        debug!("Planning stage {:?} -> {:?}", self.stage, next);
        self.stage = next;
    }
}

/// Everything shown to the user after a successful submission
#[derive(Debug, Clone, Serialize)]
pub struct TripPlan {
    pub result: ItineraryResult,
    /// False when the currency was unknown and the budget was left as is
    pub currency_converted: bool,
    /// Destination forecast; `None` when the destination was not located
    pub weather: Option<WeatherForecast>,
    pub map: Option<MapView>,
    /// Degraded-outcome messages, in the order they occurred
    pub notices: Vec<String>,
    pub stage: PlanningStage,
}

impl TripPlan {
    /// "Total Budget: 1,000.00 EUR (≈ $1,063.83)"
    #[must_use]
    pub fn budget_summary(&self) -> String {
        let request = self.result.request();
        let mut summary = format!(
            "Total Budget: {} {} (≈ ${})",
            currency::format_amount(request.budget_amount),
            request.budget_currency,
            currency::format_amount(self.result.budget_usd())
        );
        if !self.currency_converted {
            summary.push_str(" - currency not recognised, amount not converted");
        }
        summary
    }

    /// Weather block text, or `None` when no forecast section is shown
    #[must_use]
    pub fn weather_summary(&self) -> Option<String> {
        let forecast = self.weather?;
        if !forecast.is_available() {
            return Some("Weather information unavailable".to_string());
        }
        Some(format!(
            "📅 {}\n🌡️ {} ({})",
            self.result.request().travel_date.format("%B %d, %Y"),
            forecast.format_temperatures(),
            forecast.description()
        ))
    }

    pub fn to_artifact(&self) -> Result<DownloadArtifact> {
        self.result.to_artifact()
    }
}

/// The orchestrator; cheap to clone and shareable across requests
#[derive(Clone)]
pub struct TripPlanner {
    converter: Arc<CurrencyConverter>,
    generator: Arc<dyn ItineraryGenerator>,
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn WeatherProvider>,
    renderer: MapRenderer,
}

impl TripPlanner {
    pub fn new(
        converter: Arc<CurrencyConverter>,
        generator: Arc<dyn ItineraryGenerator>,
        geocoder: Arc<dyn Geocoder>,
        weather: Arc<dyn WeatherProvider>,
    ) -> Self {
        Self {
            converter,
            generator,
            geocoder,
            weather,
            renderer: MapRenderer,
        }
    }

    /// Wire up the real service clients from configuration
    pub fn from_config(config: &TripPlannerConfig) -> anyhow::Result<Self> {
        let api_key = config
            .gemini
            .api_key
            .clone()
            .ok_or_else(|| TripPlannerError::config("Gemini API key is missing"))?;

        let generator = GeminiClient::new(
            &config.gemini.base_url,
            &config.gemini.model,
            api_key,
            config.gemini_timeout(),
        )?;
        let geocoder =
            OpenMeteoGeocoder::new(&config.geocoding.base_url, config.geocoding_timeout())?;
        let weather =
            OpenMeteoWeather::new(&config.weather.base_url, config.weather_timeout())?;

        Ok(Self::new(
            Arc::new(CurrencyConverter::new(config.rate_table()?)),
            Arc::new(generator),
            Arc::new(geocoder),
            Arc::new(weather),
        ))
    }

    #[must_use]
    pub fn converter(&self) -> &CurrencyConverter {
        &self.converter
    }

    /// Plan a trip, judging the travel date against the local calendar
    pub async fn plan(&self, request: TripRequest) -> Result<TripPlan> {
        self.plan_as_of(request, Local::now().date_naive()).await
    }

    #[instrument(skip(self, request), fields(source = %request.source, destination = %request.destination))]
    pub async fn plan_as_of(&self, request: TripRequest, today: NaiveDate) -> Result<TripPlan> {
        let mut submission = Submission::new();
        let mut notices = Vec::new();

        submission.advance(PlanningStage::Validating);
        let budget_usd = self
            .converter
            .to_usd(request.budget_amount, &request.budget_currency);
        let checked = request.validate(today).and_then(|()| {
            // A finite budget can still overflow when divided by a rate below 1.0
            if budget_usd.is_finite() {
                Ok(())
            } else {
                Err(TripPlannerError::validation(format!(
                    "Budget of {} {} is too large to convert to USD",
                    request.budget_amount, request.budget_currency
                )))
            }
        });
        if let Err(e) = checked {
            submission.advance(PlanningStage::Idle);
            warn!("Rejected submission: {}", e);
            return Err(e);
        }

        submission.advance(PlanningStage::Converting);
        let currency_converted = self.converter.is_supported(&request.budget_currency);
        if !currency_converted {
            warn!(
                "Unknown currency {}, budget left unconverted",
                request.budget_currency
            );
            notices.push(format!(
                "Currency {} is not supported; the budget was used without conversion",
                request.budget_currency
            ));
        }

        submission.advance(PlanningStage::GeneratingItinerary);
        let prompt = compose_prompt(&request, budget_usd);
        let itinerary_text = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                submission.advance(PlanningStage::Failed);
                warn!("Itinerary generation failed: {}", e);
                return Err(e);
            }
        };

        submission.advance(PlanningStage::FetchingWeather);
        let destination_coords = self.geocoder.geocode(&request.destination).await;
        let weather = match destination_coords {
            Some(coords) => {
                let forecast = self
                    .weather
                    .get_daily_forecast(coords, request.travel_date)
                    .await;
                if !forecast.is_available() {
                    notices.push("Weather information unavailable".to_string());
                }
                Some(forecast)
            }
            None => {
                notices.push(format!(
                    "Could not locate {}; weather forecast skipped",
                    request.destination
                ));
                None
            }
        };

        submission.advance(PlanningStage::Geocoding);
        let source_coords = self.geocoder.geocode(&request.source).await;

        submission.advance(PlanningStage::Rendering);
        let map = self.renderer.render(
            (request.source.as_str(), source_coords),
            (request.destination.as_str(), destination_coords),
        );
        if map.is_none() {
            notices.push("Could not generate map due to location lookup failure".to_string());
        }

        submission.advance(PlanningStage::Complete);
        info!(
            "Planned trip with {} notice(s), map: {}, weather: {}",
            notices.len(),
            map.is_some(),
            weather.is_some_and(|w| w.is_available())
        );

        Ok(TripPlan {
            result: ItineraryResult::new(request, budget_usd, itinerary_text),
            currency_converted,
            weather,
            map,
            notices,
            stage: submission.stage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocoding::GeocodeMiss;
    use crate::models::Coordinates;
    use crate::models::TransportPreference;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockGenerator {
        reply: std::result::Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl MockGenerator {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ItineraryGenerator for MockGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(TripPlannerError::generation)
        }
    }

    struct MockGeocoder {
        places: HashMap<String, Coordinates>,
        calls: Mutex<Vec<String>>,
    }

    impl MockGeocoder {
        fn with(places: &[(&str, Coordinates)]) -> Arc<Self> {
            Arc::new(Self {
                places: places
                    .iter()
                    .map(|(name, coords)| ((*name).to_string(), *coords))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Geocoder for MockGeocoder {
        async fn lookup(&self, place: &str) -> std::result::Result<Coordinates, GeocodeMiss> {
            self.calls.lock().unwrap().push(place.to_string());
            self.places.get(place).copied().ok_or(GeocodeMiss::NoMatch)
        }
    }

    struct MockWeather {
        forecast: Option<WeatherForecast>,
        calls: AtomicUsize,
    }

    impl MockWeather {
        fn returning(forecast: Option<WeatherForecast>) -> Arc<Self> {
            Arc::new(Self {
                forecast,
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherProvider for MockWeather {
        async fn fetch_daily(
            &self,
            _coordinates: Coordinates,
            _date: NaiveDate,
        ) -> anyhow::Result<WeatherForecast> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.forecast
                .ok_or_else(|| anyhow::anyhow!("service unavailable"))
        }
    }

    const NEW_YORK: Coordinates = Coordinates {
        latitude: 40.7128,
        longitude: -74.0060,
    };
    const LONDON: Coordinates = Coordinates {
        latitude: 51.5074,
        longitude: -0.1278,
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn request() -> TripRequest {
        TripRequest {
            source: "New York".to_string(),
            destination: "London".to_string(),
            travel_date: today().succ_opt().unwrap(),
            duration_days: 5,
            budget_amount: 1000.0,
            budget_currency: "EUR".to_string(),
            transport_preference: TransportPreference::Any,
        }
    }

    fn planner(
        generator: Arc<MockGenerator>,
        geocoder: Arc<MockGeocoder>,
        weather: Arc<MockWeather>,
    ) -> TripPlanner {
        TripPlanner::new(
            Arc::new(CurrencyConverter::default()),
            generator,
            geocoder,
            weather,
        )
    }

    #[test]
    fn test_stage_transitions() {
        use PlanningStage::*;
        assert!(Idle.can_transition_to(Validating));
        assert!(Validating.can_transition_to(Idle));
        assert!(GeneratingItinerary.can_transition_to(Failed));
        assert!(!FetchingWeather.can_transition_to(Failed));
        assert!(!Geocoding.can_transition_to(Failed));
        assert!(!Idle.can_transition_to(Complete));
        assert!(!Complete.can_transition_to(Idle));
    }

    #[tokio::test]
    async fn test_full_plan() {
        let generator = MockGenerator::ok("Day 1: Tower of London");
        let geocoder = MockGeocoder::with(&[("New York", NEW_YORK), ("London", LONDON)]);
        let weather = MockWeather::returning(Some(WeatherForecast::new(14.0, 8.0, 3)));
        let planner = planner(generator.clone(), geocoder.clone(), weather.clone());

        let plan = planner.plan_as_of(request(), today()).await.unwrap();

        assert_eq!(plan.stage, PlanningStage::Complete);
        assert!((plan.result.budget_usd() - 1063.83).abs() < 0.01);
        assert_eq!(plan.result.itinerary_text(), "Day 1: Tower of London");
        assert_eq!(plan.weather, Some(WeatherForecast::new(14.0, 8.0, 3)));
        assert!(plan.map.is_some());
        assert!(plan.notices.is_empty());
        assert_eq!(plan.budget_summary(), "Total Budget: 1,000.00 EUR (≈ $1,063.83)");
        assert_eq!(
            plan.weather_summary().unwrap(),
            "📅 October 17, 2026\n🌡️ Max: 14.0°C | Min: 8.0°C (Overcast)"
        );

        // Destination is looked up before the source, once each
        assert_eq!(geocoder.calls(), ["London", "New York"]);
        assert_eq!(weather.call_count(), 1);
        assert_eq!(generator.call_count(), 1);
        assert!(generator.prompts.lock().unwrap()[0].contains("within $1063.83 total budget"));
    }

    #[tokio::test]
    async fn test_empty_destination_makes_no_calls() {
        let generator = MockGenerator::ok("unused");
        let geocoder = MockGeocoder::with(&[]);
        let weather = MockWeather::returning(None);
        let planner = planner(generator.clone(), geocoder.clone(), weather.clone());

        let mut req = request();
        req.destination = String::new();
        let err = planner.plan_as_of(req, today()).await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(generator.call_count(), 0);
        assert!(geocoder.calls().is_empty());
        assert_eq!(weather.call_count(), 0);
    }

    #[tokio::test]
    async fn test_budget_overflowing_usd_is_rejected() {
        let generator = MockGenerator::ok("unused");
        let geocoder = MockGeocoder::with(&[("New York", NEW_YORK), ("London", LONDON)]);
        let weather = MockWeather::returning(None);
        let planner = planner(generator.clone(), geocoder.clone(), weather.clone());

        // Finite and non-negative, but 1.7e308 / 0.94 is infinite
        let mut req = request();
        req.budget_amount = 1.7e308;
        assert!(req.validate(today()).is_ok());
        let err = planner.plan_as_of(req, today()).await.unwrap_err();

        assert!(err.is_validation());
        assert!(err.user_message().contains("too large"));
        assert_eq!(generator.call_count(), 0);
        assert!(geocoder.calls().is_empty());
    }

    #[tokio::test]
    async fn test_large_budget_in_stronger_currency_is_kept() {
        let generator = MockGenerator::ok("Day 1");
        let geocoder = MockGeocoder::with(&[("New York", NEW_YORK), ("London", LONDON)]);
        let weather = MockWeather::returning(Some(WeatherForecast::new(14.0, 8.0, 3)));
        let planner = planner(generator, geocoder, weather);

        let mut req = request();
        req.budget_amount = 1.7e308;
        req.budget_currency = "INR".to_string();
        let plan = planner.plan_as_of(req, today()).await.unwrap();

        let artifact: serde_json::Value =
            serde_json::from_str(&plan.to_artifact().unwrap().content).unwrap();
        let budget_usd = artifact["budget_usd"].as_f64().unwrap();
        assert!((budget_usd / (1.7e308 / 83.0) - 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_generation_failure_stops_everything() {
        let generator = MockGenerator::failing("HTTP 503: overloaded");
        let geocoder = MockGeocoder::with(&[("New York", NEW_YORK), ("London", LONDON)]);
        let weather = MockWeather::returning(Some(WeatherForecast::new(14.0, 8.0, 3)));
        let planner = planner(generator.clone(), geocoder.clone(), weather.clone());

        let err = planner.plan_as_of(request(), today()).await.unwrap_err();

        assert!(matches!(err, TripPlannerError::Generation { .. }));
        assert!(err.user_message().contains("overloaded"));
        assert!(geocoder.calls().is_empty());
        assert_eq!(weather.call_count(), 0);
    }

    #[tokio::test]
    async fn test_source_geocoding_failure_skips_only_map() {
        let generator = MockGenerator::ok("Day 1");
        let geocoder = MockGeocoder::with(&[("London", LONDON)]);
        let weather = MockWeather::returning(Some(WeatherForecast::new(14.0, 8.0, 3)));
        let planner = planner(generator, geocoder, weather);

        let plan = planner.plan_as_of(request(), today()).await.unwrap();

        assert!(plan.map.is_none());
        assert!(plan.weather.is_some());
        assert_eq!(plan.result.itinerary_text(), "Day 1");
        assert!(plan.budget_summary().contains("1,000.00 EUR"));
        assert_eq!(
            plan.notices,
            ["Could not generate map due to location lookup failure"]
        );
        assert_eq!(plan.to_artifact().unwrap().file_name, "trip_New York_to_London.json");
    }

    #[tokio::test]
    async fn test_destination_not_found_skips_weather_and_map() {
        let generator = MockGenerator::ok("Day 1");
        let geocoder = MockGeocoder::with(&[("New York", NEW_YORK)]);
        let weather = MockWeather::returning(Some(WeatherForecast::new(14.0, 8.0, 3)));
        let planner = planner(generator, geocoder, weather.clone());

        let plan = planner.plan_as_of(request(), today()).await.unwrap();

        assert_eq!(plan.weather, None);
        assert!(plan.weather_summary().is_none());
        assert!(plan.map.is_none());
        assert_eq!(weather.call_count(), 0);
        assert_eq!(plan.stage, PlanningStage::Complete);
    }

    #[tokio::test]
    async fn test_weather_failure_shows_unavailable() {
        let generator = MockGenerator::ok("Day 1");
        let geocoder = MockGeocoder::with(&[("New York", NEW_YORK), ("London", LONDON)]);
        let weather = MockWeather::returning(None);
        let planner = planner(generator, geocoder, weather);

        let plan = planner.plan_as_of(request(), today()).await.unwrap();

        assert_eq!(plan.weather, Some(WeatherForecast::unavailable()));
        assert_eq!(
            plan.weather_summary().as_deref(),
            Some("Weather information unavailable")
        );
        assert!(plan.map.is_some());
    }

    #[tokio::test]
    async fn test_artifact_budget_matches_conversion() {
        let generator = MockGenerator::ok("Day 1");
        let geocoder = MockGeocoder::with(&[]);
        let weather = MockWeather::returning(None);
        let planner = planner(generator, geocoder, weather);

        for code in ["INR", "JPY", "GBP", "USD", "XYZ"] {
            let mut req = request();
            req.budget_currency = code.to_string();
            let plan = planner.plan_as_of(req, today()).await.unwrap();

            let artifact = plan.to_artifact().unwrap();
            let record: serde_json::Value = serde_json::from_str(&artifact.content).unwrap();
            assert_eq!(record["currency"], code);
            let expected = planner.converter().to_usd(1000.0, code);
            assert!((record["budget_usd"].as_f64().unwrap() - expected).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_unknown_currency_is_surfaced() {
        let generator = MockGenerator::ok("Day 1");
        let geocoder = MockGeocoder::with(&[("New York", NEW_YORK), ("London", LONDON)]);
        let weather = MockWeather::returning(Some(WeatherForecast::new(14.0, 8.0, 3)));
        let planner = planner(generator, geocoder, weather);

        let mut req = request();
        req.budget_currency = "XYZ".to_string();
        let plan = planner.plan_as_of(req, today()).await.unwrap();

        assert!(!plan.currency_converted);
        assert_eq!(plan.result.budget_usd(), 1000.0);
        assert!(plan.budget_summary().contains("not converted"));
        assert_eq!(plan.notices.len(), 1);
    }
}
