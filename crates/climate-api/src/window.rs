//! Most-recent-year window arithmetic.

use chrono::{Duration, NaiveDate};

/// Cutoff date for the trailing-year window: the latest date in the
/// sequence minus 365 days. Returns `None` when the sequence is empty,
/// since an empty dataset has no most recent date to anchor the window.
///
/// Rows qualify for the window when their date is strictly greater than
/// the returned cutoff.
pub fn recent_year_cutoff<I>(dates: I) -> Option<NaiveDate>
where
    I: IntoIterator<Item = NaiveDate>,
{
    dates
        .into_iter()
        .max()
        .map(|latest| latest - Duration::days(365))
}
