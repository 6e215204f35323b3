//! Error taxonomy for the analytics core.
//!
//! Every variant is an expected, reportable outcome. Per-symbol variants are
//! stored in reports next to the symbols that succeeded, so the type is
//! `Clone + PartialEq + Serialize`.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalyticsError {
    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid monthly amount {amount}: must be finite and non-negative")]
    InvalidAmount { amount: f64 },

    #[error("unknown company or symbol '{name}' in the symbol directory")]
    UnknownCompany { name: String },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no history for '{symbol}' between {start} and {end}")]
    EmptyHistory {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("return unavailable for '{symbol}': first close is zero or undefined")]
    UndefinedAnchor { symbol: String },

    #[error("monthly return unavailable for '{symbol}': close for {month} is zero or undefined")]
    UndefinedMonthlyAnchor { symbol: String, month: NaiveDate },

    #[error("provider unavailable for '{symbol}': {reason}")]
    ProviderUnavailable { symbol: String, reason: String },

    #[error("series for '{symbol}' is not strictly increasing at {date}")]
    UnorderedDates { symbol: String, date: NaiveDate },
}

impl AnalyticsError {
    /// Symbol the error belongs to, for per-symbol variants.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::UnknownCompany { name } => Some(name),
            Self::SymbolNotFound { symbol }
            | Self::EmptyHistory { symbol, .. }
            | Self::UndefinedAnchor { symbol }
            | Self::UndefinedMonthlyAnchor { symbol, .. }
            | Self::ProviderUnavailable { symbol, .. }
            | Self::UnorderedDates { symbol, .. } => Some(symbol),
            Self::InvalidRange { .. } | Self::InvalidAmount { .. } => None,
        }
    }
}

/// Precondition check shared by every entry point that takes a date window.
pub fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), AnalyticsError> {
    if start > end {
        return Err(AnalyticsError::InvalidRange { start, end });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_check() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!(check_range(a, b).is_ok());
        assert!(check_range(a, a).is_ok());
        assert_eq!(
            check_range(b, a),
            Err(AnalyticsError::InvalidRange { start: b, end: a })
        );
    }

    #[test]
    fn symbol_accessor() {
        let err = AnalyticsError::EmptyHistory {
            symbol: "B".into(),
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        };
        assert_eq!(err.symbol(), Some("B"));
        assert_eq!(AnalyticsError::InvalidAmount { amount: -1.0 }.symbol(), None);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let err = AnalyticsError::SymbolNotFound { symbol: "ZZZ".into() };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "symbol_not_found");
        assert_eq!(json["symbol"], "ZZZ");

        let err = AnalyticsError::UndefinedMonthlyAnchor {
            symbol: "KO".into(),
            month: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "undefined_monthly_anchor");
        assert_eq!(json["month"], "2024-01-01");
        assert_eq!(err.symbol(), Some("KO"));
    }
}
