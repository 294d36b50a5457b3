//! Record predicates for the dashboard filter.
//!
//! Every predicate is pure: the same record and filter always give the same
//! answer, which is what lets [`crate::derive::ViewCache`] key on the
//! filter value alone.

use chrono::NaiveDateTime;
use mobility_map_analytics_models::{DateWindow, FilterConfig};
use mobility_map_survey_models::{
    AgeRange, EducationStat, IncomeStat, TOP_BUCKET_AGE, VisitorRecord,
};

/// Whether an age bucket lies inside `from..=to`.
///
/// Closed buckets must be fully contained in the range; touching or
/// overlapping is not enough. The open-ended top bucket matches whenever
/// the range covers its lower edge. Unknown ages never match.
#[must_use]
pub const fn age_matches(age: AgeRange, from: i32, to: i32) -> bool {
    if age.is_top() {
        return from <= TOP_BUCKET_AGE && TOP_BUCKET_AGE <= to;
    }
    match age.bounds() {
        Some((low, high)) => from <= low && high <= to,
        None => false,
    }
}

/// Whether a timestamp passes the optional window. Records without a valid
/// timestamp never pass a configured window.
#[must_use]
pub fn date_matches(timestamp: Option<NaiveDateTime>, window: Option<&DateWindow>) -> bool {
    match window {
        None => true,
        Some(window) => timestamp.is_some_and(|t| window.contains(t)),
    }
}

/// Whether a visitor record passes every part of the filter.
#[must_use]
pub fn matches(record: &VisitorRecord, filter: &FilterConfig) -> bool {
    let gender = filter.gender.is_none_or(|gender| gender == record.gender);
    let visitor_type = filter
        .visitor_type
        .is_none_or(|visitor_type| record.visitor_type == Some(visitor_type));

    gender
        && visitor_type
        && age_matches(record.age_range, filter.age_from, filter.age_to)
        && date_matches(record.timestamp, filter.date_window.as_ref())
}

/// Visitor records passing the filter, in source order.
pub fn filter_visitors<'a>(
    records: &'a [VisitorRecord],
    filter: &'a FilterConfig,
) -> impl Iterator<Item = &'a VisitorRecord> + 'a {
    records.iter().filter(move |record| matches(record, filter))
}

/// Income rows whose age bracket passes the filter's age range.
pub fn filter_income<'a>(
    stats: &'a [IncomeStat],
    filter: &'a FilterConfig,
) -> impl Iterator<Item = &'a IncomeStat> + 'a {
    stats
        .iter()
        .filter(move |stat| age_matches(stat.age_range, filter.age_from, filter.age_to))
}

/// Education rows whose age bracket passes the filter's age range.
pub fn filter_education<'a>(
    stats: &'a [EducationStat],
    filter: &'a FilterConfig,
) -> impl Iterator<Item = &'a EducationStat> + 'a {
    stats
        .iter()
        .filter(move |stat| age_matches(stat.age_range, filter.age_from, filter.age_to))
}
