//! Travel Planner Pro - AI-assisted trip planning
//!
//! This library turns a trip form (origin, destination, date, duration,
//! budget and transport preference) into a generated itinerary, a
//! destination weather forecast, a two-point route map and a downloadable
//! itinerary record.

pub mod api;
pub mod cli;
pub mod config;
pub mod currency;
pub mod error;
pub mod geocoding;
pub mod itinerary;
pub mod logging;
pub mod map;
pub mod models;
pub mod planner;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use config::TripPlannerConfig;
pub use currency::{CurrencyConverter, RateTable};
pub use error::TripPlannerError;
pub use geocoding::{GeocodeMiss, Geocoder, OpenMeteoGeocoder};
pub use itinerary::{GeminiClient, ItineraryGenerator};
pub use map::{MapRenderer, MapView};
pub use models::{Coordinates, ItineraryResult, TransportPreference, TripRequest, WeatherForecast};
pub use planner::{PlanningStage, TripPlan, TripPlanner};
pub use weather::{OpenMeteoWeather, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TripPlannerError>;
