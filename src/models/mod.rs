//! Data models for the trip planner
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates
//! - Weather: Single-day destination forecast and its sentinel
//! - Trip: Form input and the downloadable itinerary record

pub mod location;
pub mod trip;
pub mod weather;

// Re-export all public types for convenient access
pub use location::Coordinates;
pub use trip::{DownloadArtifact, ItineraryResult, TransportPreference, TripRequest};
pub use weather::{UNAVAILABLE_WEATHER_CODE, WeatherForecast, weather_code_to_description};
