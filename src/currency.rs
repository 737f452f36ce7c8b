//! Static currency conversion to USD
//!
//! Rates are expressed as local units per one US dollar, so `INR = 83.0`
//! means 83 rupees buy one dollar. The table is loaded once at startup and
//! shared read-only; there is no live rate fetching.

use crate::TripPlannerError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Code of the base currency. Always maps to 1.0.
pub const BASE_CURRENCY: &str = "USD";

/// Approximate rates as of February 2025
const BUILTIN_RATES: [(&str, f64); 9] = [
    ("INR", 83.0),
    ("EUR", 0.94),
    ("GBP", 0.80),
    ("JPY", 150.0),
    ("CAD", 1.35),
    ("AUD", 1.50),
    ("CHF", 0.90),
    ("CNY", 7.10),
    ("USD", 1.0),
];

/// Read-only mapping from currency code to units per USD
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateTable {
    rates: BTreeMap<String, f64>,
}

/// One row of the rate table, as offered to form clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyRate {
    pub code: String,
    pub units_per_usd: f64,
}

impl RateTable {
    /// Build a table from arbitrary rates.
    ///
    /// Codes are normalized to upper case. Every rate must be positive and
    /// finite, and USD, if present, must be exactly 1.0. USD is added when
    /// missing.
    pub fn from_rates<I, S>(rates: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut table = BTreeMap::new();
        for (code, rate) in rates {
            let code = code.as_ref().trim().to_ascii_uppercase();
            if code.is_empty() {
                return Err(TripPlannerError::config("Currency code cannot be empty"));
            }
            if !rate.is_finite() || rate <= 0.0 {
                return Err(TripPlannerError::config(format!(
                    "Rate for {code} must be a positive number, got {rate}"
                )));
            }
            if code == BASE_CURRENCY && rate != 1.0 {
                return Err(TripPlannerError::config(format!(
                    "Rate for {BASE_CURRENCY} must be 1.0, got {rate}"
                )));
            }
            table.insert(code, rate);
        }
        table.entry(BASE_CURRENCY.to_string()).or_insert(1.0);
        Ok(Self { rates: table })
    }

    /// Look up units per USD for a code (case-insensitive)
    #[must_use]
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(&code.trim().to_ascii_uppercase()).copied()
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.rate(code).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// All rows sorted by currency code
    #[must_use]
    pub fn entries(&self) -> Vec<CurrencyRate> {
        self.rates
            .iter()
            .map(|(code, rate)| CurrencyRate {
                code: code.clone(),
                units_per_usd: *rate,
            })
            .collect()
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            rates: BUILTIN_RATES
                .iter()
                .map(|(code, rate)| ((*code).to_string(), *rate))
                .collect(),
        }
    }
}

/// Converts budget amounts into USD using an injected rate table
#[derive(Debug, Clone, Default)]
pub struct CurrencyConverter {
    table: RateTable,
}

impl CurrencyConverter {
    #[must_use]
    pub fn new(table: RateTable) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn table(&self) -> &RateTable {
        &self.table
    }

    /// Whether `currency` is known to the rate table
    #[must_use]
    pub fn is_supported(&self, currency: &str) -> bool {
        self.table.contains(currency)
    }

    /// Convert `amount` to USD.
    ///
    /// Unknown codes return `amount` unchanged; callers use
    /// [`CurrencyConverter::is_supported`] to tell the user no conversion
    /// took place. No rounding is applied.
    #[must_use]
    pub fn to_usd(&self, amount: f64, currency: &str) -> f64 {
        match self.table.rate(currency) {
            Some(rate) => amount / rate,
            None => amount,
        }
    }
}

/// Format a money amount with thousands separators and two decimals
#[must_use]
pub fn format_amount(amount: f64) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}
