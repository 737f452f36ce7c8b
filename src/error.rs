//! Error types and handling for the trip planner

use thiserror::Error;

/// Main error type for the trip planner
#[derive(Error, Debug)]
pub enum TripPlannerError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Itinerary generation failed; the only blocking failure of a submission
    #[error("Itinerary generation failed: {message}")]
    Generation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON encoding errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl TripPlannerError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new itinerary generation error
    pub fn generation<S: Into<String>>(message: S) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Whether the error was raised before any external call was made
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, TripPlannerError::Validation { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TripPlannerError::Config { message } => {
                format!("Configuration error: {message}. Please check your config file and API keys.")
            }
            TripPlannerError::Validation { message } => message.clone(),
            TripPlannerError::Generation { message } => {
                format!("Error generating travel plan: {message}")
            }
            TripPlannerError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            TripPlannerError::Serialization { .. } => {
                "Could not prepare the itinerary for download.".to_string()
            }
        }
    }
}
