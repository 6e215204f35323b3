//! Symbol directory: company display name to ticker lookup.
//!
//! The directory is an immutable value built once by the caller (from the S&P 500
//! listing CSV or the built-in sample) and passed to whatever needs it. Reloading
//! means building a new directory.

use crate::error::AnalyticsError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// One row of the listing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Security")]
    pub security: String,
    #[serde(rename = "GICS Sector", default)]
    pub sector: String,
    #[serde(rename = "GICS Sub-Industry", default)]
    pub sub_industry: String,
    #[serde(rename = "Headquarters Location", default)]
    pub headquarters: String,
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("read directory file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("parse directory row {row}: {reason}")]
    Parse { row: usize, reason: String },
}

/// Immutable company → ticker mapping plus the full listing table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SymbolDirectory {
    by_name: BTreeMap<String, String>,
    listings: Vec<Listing>,
}

impl SymbolDirectory {
    /// Build from listing rows. On duplicate display names the first row wins.
    pub fn from_listings(listings: Vec<Listing>) -> Self {
        let mut by_name = BTreeMap::new();
        for listing in &listings {
            by_name
                .entry(listing.security.clone())
                .or_insert_with(|| listing.symbol.clone());
        }
        Self { by_name, listings }
    }

    /// Load from a CSV file in the Wikipedia S&P 500 table layout.
    pub fn from_csv_path(path: &Path) -> Result<Self, DirectoryError> {
        let file = std::fs::File::open(path).map_err(|e| DirectoryError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_csv_reader(file)
    }

    /// Load from any CSV reader with a `Symbol,Security,...` header.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DirectoryError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut listings = Vec::new();
        for (row, record) in csv_reader.deserialize::<Listing>().enumerate() {
            let listing = record.map_err(|e| DirectoryError::Parse {
                row: row + 1,
                reason: e.to_string(),
            })?;
            listings.push(listing);
        }
        Ok(Self::from_listings(listings))
    }

    /// Resolve a user query to a ticker.
    ///
    /// Tries an exact display name, then a case-insensitive display name, then a
    /// listed ticker (case-insensitive).
    pub fn resolve(&self, query: &str) -> Result<&str, AnalyticsError> {
        let query = query.trim();
        if let Some(symbol) = self.by_name.get(query) {
            return Ok(symbol.as_str());
        }
        let lowered = query.to_lowercase();
        if let Some((_, symbol)) = self
            .by_name
            .iter()
            .find(|(name, _)| name.to_lowercase() == lowered)
        {
            return Ok(symbol.as_str());
        }
        self.listings
            .iter()
            .find(|l| l.symbol.eq_ignore_ascii_case(query))
            .map(|l| l.symbol.as_str())
            .ok_or_else(|| AnalyticsError::UnknownCompany {
                name: query.to_string(),
            })
    }

    /// Display name for a ticker, if listed.
    pub fn company_for(&self, symbol: &str) -> Option<&str> {
        self.listings
            .iter()
            .find(|l| l.symbol == symbol)
            .map(|l| l.security.as_str())
    }

    /// Display name → ticker mapping.
    pub fn names(&self) -> &BTreeMap<String, String> {
        &self.by_name
    }

    /// The full listing table, in source order.
    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Small built-in excerpt of the S&P 500 listing.
    pub fn sample_sp500() -> Self {
        let rows = [
            ("AAPL", "Apple Inc.", "Information Technology", "Technology Hardware, Storage & Peripherals", "Cupertino, California"),
            ("MSFT", "Microsoft", "Information Technology", "Systems Software", "Redmond, Washington"),
            ("GOOGL", "Alphabet Inc. (Class A)", "Communication Services", "Interactive Media & Services", "Mountain View, California"),
            ("AMZN", "Amazon", "Consumer Discretionary", "Broadline Retail", "Seattle, Washington"),
            ("NVDA", "Nvidia", "Information Technology", "Semiconductors", "Santa Clara, California"),
            ("META", "Meta Platforms", "Communication Services", "Interactive Media & Services", "Menlo Park, California"),
            ("JNJ", "Johnson & Johnson", "Health Care", "Pharmaceuticals", "New Brunswick, New Jersey"),
            ("PFE", "Pfizer", "Health Care", "Pharmaceuticals", "New York City, New York"),
            ("JPM", "JPMorgan Chase", "Financials", "Diversified Banks", "New York City, New York"),
            ("V", "Visa Inc.", "Financials", "Transaction & Payment Processing Services", "San Francisco, California"),
            ("XOM", "ExxonMobil", "Energy", "Integrated Oil & Gas", "Spring, Texas"),
            ("CVX", "Chevron Corporation", "Energy", "Integrated Oil & Gas", "San Ramon, California"),
            ("KO", "Coca-Cola Company (The)", "Consumer Staples", "Soft Drinks & Non-alcoholic Beverages", "Atlanta, Georgia"),
            ("PEP", "PepsiCo", "Consumer Staples", "Soft Drinks & Non-alcoholic Beverages", "Purchase, New York"),
            ("PG", "Procter & Gamble", "Consumer Staples", "Personal Care Products", "Cincinnati, Ohio"),
            ("WMT", "Walmart", "Consumer Staples", "Consumer Staples Merchandise Retail", "Bentonville, Arkansas"),
            ("MCD", "McDonald's", "Consumer Discretionary", "Restaurants", "Chicago, Illinois"),
            ("HD", "Home Depot (The)", "Consumer Discretionary", "Home Improvement Retail", "Atlanta, Georgia"),
        ];

        Self::from_listings(
            rows.into_iter()
                .map(|(symbol, security, sector, sub_industry, headquarters)| Listing {
                    symbol: symbol.into(),
                    security: security.into(),
                    sector: sector.into(),
                    sub_industry: sub_industry.into(),
                    headquarters: headquarters.into(),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_directory_resolves_names_and_tickers() {
        let dir = SymbolDirectory::sample_sp500();
        assert_eq!(dir.resolve("Microsoft").unwrap(), "MSFT");
        assert_eq!(dir.resolve("microsoft").unwrap(), "MSFT");
        assert_eq!(dir.resolve("aapl").unwrap(), "AAPL");
        assert_eq!(dir.company_for("KO"), Some("Coca-Cola Company (The)"));
    }

    #[test]
    fn unknown_name_is_resolution_error() {
        let dir = SymbolDirectory::sample_sp500();
        assert_eq!(
            dir.resolve("Initech"),
            Err(AnalyticsError::UnknownCompany {
                name: "Initech".into()
            })
        );
    }

    #[test]
    fn loads_wikipedia_layout() {
        let csv = "Symbol,Security,GICS Sector,GICS Sub-Industry,Headquarters Location,Date added,CIK,Founded\n\
                   MMM,3M,Industrials,Industrial Conglomerates,\"Saint Paul, Minnesota\",1957-03-04,66740,1902\n\
                   AOS,A. O. Smith,Industrials,Building Products,\"Milwaukee, Wisconsin\",2017-07-26,91142,1916\n";
        let dir = SymbolDirectory::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.resolve("3M").unwrap(), "MMM");
        assert_eq!(dir.listings()[1].headquarters, "Milwaukee, Wisconsin");
    }

    #[test]
    fn minimal_header_is_enough() {
        let csv = "Symbol,Security\nKO,Coca-Cola\n";
        let dir = SymbolDirectory::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(dir.names().get("Coca-Cola").map(String::as_str), Some("KO"));
        assert_eq!(dir.listings()[0].sector, "");
    }

    #[test]
    fn duplicate_names_keep_first() {
        let csv = "Symbol,Security\nGOOGL,Alphabet\nGOOG,Alphabet\n";
        let dir = SymbolDirectory::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(dir.resolve("Alphabet").unwrap(), "GOOGL");
        assert_eq!(dir.resolve("GOOG").unwrap(), "GOOG");
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sp500.csv");
        std::fs::write(&path, "Symbol,Security\nKO,Coca-Cola\n").unwrap();
        let directory = SymbolDirectory::from_csv_path(&path).unwrap();
        assert_eq!(directory.len(), 1);
        assert!(SymbolDirectory::from_csv_path(&dir.path().join("missing.csv")).is_err());
    }
}
