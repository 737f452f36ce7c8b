//! Single-day weather forecast model

use serde::{Deserialize, Serialize};

/// Weather code reserved for "no forecast available". Real WMO codes are
/// never negative.
pub const UNAVAILABLE_WEATHER_CODE: i32 = -1;

/// Daily forecast for the destination on the travel date
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct WeatherForecast {
    /// Maximum temperature in Celsius
    #[serde(rename = "max_temp")]
    pub max_temp_c: f64,
    /// Minimum temperature in Celsius
    #[serde(rename = "min_temp")]
    pub min_temp_c: f64,
    /// WMO weather interpretation code, or [`UNAVAILABLE_WEATHER_CODE`]
    pub weather_code: i32,
}

impl WeatherForecast {
    #[must_use]
    pub fn new(max_temp_c: f64, min_temp_c: f64, weather_code: i32) -> Self {
        Self {
            max_temp_c,
            min_temp_c,
            weather_code,
        }
    }

    /// The sentinel returned whenever the weather service cannot answer
    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            max_temp_c: 0.0,
            min_temp_c: 0.0,
            weather_code: UNAVAILABLE_WEATHER_CODE,
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.weather_code != UNAVAILABLE_WEATHER_CODE
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        weather_code_to_description(self.weather_code)
    }

    /// Format temperature range with unit
    #[must_use]
    pub fn format_temperatures(&self) -> String {
        format!(
            "Max: {:.1}°C | Min: {:.1}°C",
            self.max_temp_c, self.min_temp_c
        )
    }
}

/// Convert a WMO weather code to human-readable description
#[must_use]
pub fn weather_code_to_description(code: i32) -> &'static str {
    match code {
        UNAVAILABLE_WEATHER_CODE => "Unavailable",
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}
