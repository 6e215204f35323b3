//! Data collaborators: providers, retry, symbol directory

pub mod csv_import;
pub mod directory;
pub mod provider;
pub mod retry;
pub mod synthetic;
pub mod yahoo;

pub use csv_import::CsvProvider;
pub use directory::{DirectoryError, Listing, SymbolDirectory};
pub use provider::{DataSource, InMemoryProvider, MarketDataProvider, ProviderError, RawBar};
pub use retry::{RetryPolicy, RetryingProvider};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
