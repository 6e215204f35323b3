//! Calendar-month helpers shared by the resampler and the savings schedule.

use chrono::{Datelike, Months, NaiveDate};

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the month after the one containing `date`.
pub fn next_month_start(date: NaiveDate) -> Option<NaiveDate> {
    month_start(date).checked_add_months(Months::new(1))
}

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    next_month_start(date)
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Month starts from the month of `first` through the month of `last`, inclusive.
pub fn months_between(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let last = month_start(last);
    let mut months = Vec::new();
    let mut current = month_start(first);
    while current <= last {
        months.push(current);
        match next_month_start(current) {
            Some(next) => current = next,
            None => break,
        }
    }
    months
}
