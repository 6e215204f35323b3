//! Domain types: daily points, price series, calendar helpers.

pub mod calendar;
pub mod series;

pub use series::{usable_price, DailyPoint, PriceSeries};
