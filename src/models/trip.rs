//! Trip request and the downloadable itinerary record

use crate::TripPlannerError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Preferred way of travelling between source and destination
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportPreference {
    #[default]
    Any,
    Flight,
    Train,
    Bus,
    Car,
}

impl TransportPreference {
    /// All options in form order
    pub const ALL: [TransportPreference; 5] = [
        TransportPreference::Any,
        TransportPreference::Flight,
        TransportPreference::Train,
        TransportPreference::Bus,
        TransportPreference::Car,
    ];

    /// Concrete modes, i.e. everything except `Any`
    pub fn modes() -> impl Iterator<Item = TransportPreference> {
        Self::ALL
            .into_iter()
            .filter(|mode| *mode != TransportPreference::Any)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportPreference::Any => "Any",
            TransportPreference::Flight => "Flight",
            TransportPreference::Train => "Train",
            TransportPreference::Bus => "Bus",
            TransportPreference::Car => "Car",
        }
    }
}

impl Display for TransportPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown transport '{s}', expected one of: {}",
                    Self::ALL.map(|m| m.as_str()).join(", ")
                )
            })
    }
}

/// Everything the user typed into the planning form
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TripRequest {
    /// Starting point, free-text place name
    pub source: String,
    /// Destination, free-text place name
    pub destination: String,
    #[serde(rename = "date")]
    pub travel_date: NaiveDate,
    #[serde(rename = "duration")]
    pub duration_days: u32,
    #[serde(rename = "budget")]
    pub budget_amount: f64,
    /// Currency code of `budget_amount`
    #[serde(rename = "currency")]
    pub budget_currency: String,
    #[serde(rename = "preference", default)]
    pub transport_preference: TransportPreference,
}

impl TripRequest {
    /// Check the form invariants against `today`.
    ///
    /// Runs before any network call; the first violated rule is reported.
    pub fn validate(&self, today: NaiveDate) -> crate::Result<()> {
        if self.source.trim().is_empty() || self.destination.trim().is_empty() {
            return Err(TripPlannerError::validation(
                "Please fill in both starting point and destination",
            ));
        }
        if self.travel_date < today {
            return Err(TripPlannerError::validation(format!(
                "Travel date {} is in the past",
                self.travel_date.format("%Y-%m-%d")
            )));
        }
        if self.duration_days < 1 {
            return Err(TripPlannerError::validation(
                "Trip duration must be at least 1 day",
            ));
        }
        if !self.budget_amount.is_finite() || self.budget_amount < 0.0 {
            return Err(TripPlannerError::validation(
                "Budget must be a non-negative amount",
            ));
        }
        Ok(())
    }
}

/// The composed result of one successful submission. Immutable once built.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ItineraryResult {
    #[serde(flatten)]
    request: TripRequest,
    budget_usd: f64,
    #[serde(rename = "itinerary")]
    itinerary_text: String,
}

/// A ready-to-save file: name plus pretty-printed JSON body
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DownloadArtifact {
    pub file_name: String,
    pub content: String,
}

impl ItineraryResult {
    #[must_use]
    pub fn new(request: TripRequest, budget_usd: f64, itinerary_text: String) -> Self {
        Self {
            request,
            budget_usd,
            itinerary_text,
        }
    }

    #[must_use]
    pub fn request(&self) -> &TripRequest {
        &self.request
    }

    #[must_use]
    pub fn budget_usd(&self) -> f64 {
        self.budget_usd
    }

    #[must_use]
    pub fn itinerary_text(&self) -> &str {
        &self.itinerary_text
    }

    /// `trip_{source}_to_{destination}.json`
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "trip_{}_to_{}.json",
            self.request.source, self.request.destination
        )
    }

    /// Serialize into the downloadable record
    pub fn to_artifact(&self) -> crate::Result<DownloadArtifact> {
        Ok(DownloadArtifact {
            file_name: self.file_name(),
            content: serde_json::to_string_pretty(self)?,
        })
    }
}

impl DownloadArtifact {
    /// File name usable on disk: path separators become underscores
    #[must_use]
    pub fn disk_file_name(&self) -> String {
        self.file_name.replace(['/', '\\'], "_")
    }
}
