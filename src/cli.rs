//! CLI command definitions and subcommands

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::{TransportPreference, TripRequest};

/// Travel Planner Pro - AI itineraries with weather and route maps
#[derive(Parser, Debug)]
#[command(
    name = "tripplanner",
    about = "AI travel planner: itinerary generation, destination weather and route maps",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the planning form over HTTP
    Serve {
        /// Address to bind (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Plan one trip and write the itinerary file
    Plan(PlanArgs),
}

#[derive(Debug, clap::Args)]
pub struct PlanArgs {
    /// Starting point
    #[arg(long = "from")]
    pub source: String,

    /// Destination
    #[arg(long = "to")]
    pub destination: String,

    /// Travel date (YYYY-MM-DD), defaults to today
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// Trip duration in days
    #[arg(long, default_value_t = 1)]
    pub days: u32,

    /// Total budget
    #[arg(short, long, default_value_t = 500.0)]
    pub budget: f64,

    /// Budget currency code
    #[arg(long, default_value = "INR")]
    pub currency: String,

    /// Preferred transport (any, flight, train, bus, car)
    #[arg(short, long, default_value = "any")]
    pub transport: TransportPreference,

    /// Directory for the itinerary file (defaults to output.directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl PlanArgs {
    #[must_use]
    pub fn to_request(&self, today: NaiveDate) -> TripRequest {
        TripRequest {
            source: self.source.clone(),
            destination: self.destination.clone(),
            travel_date: self.date.unwrap_or(today),
            duration_days: self.days,
            budget_amount: self.budget,
            budget_currency: self.currency.to_ascii_uppercase(),
            transport_preference: self.transport,
        }
    }
}
