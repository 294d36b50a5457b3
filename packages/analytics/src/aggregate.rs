//! Per-zone usage aggregation and summary-table grouping.

use std::collections::BTreeMap;

use mobility_map_analytics_models::{AggregationMode, UsageStats, ZoneUsage};
use mobility_map_survey_models::{EducationStat, IncomeStat, VisitorRecord};

use crate::AnalyticsError;

/// Result of folding filtered records into zone usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageTally {
    pub usage: ZoneUsage,
    /// Records folded in.
    pub records: usize,
    /// Records that contributed nothing because a count or zone was
    /// malformed.
    pub skipped: usize,
}

/// Folds visitor records into per-zone totals.
///
/// In [`AggregationMode::Direct`] each record adds its visitor count to its
/// zone. In [`AggregationMode::Distribution`] each record adds every entry
/// of its zone distribution; records without one add nothing.
#[must_use]
pub fn aggregate_usage<'a>(
    records: impl IntoIterator<Item = &'a VisitorRecord>,
    mode: AggregationMode,
) -> UsageTally {
    let mut tally = UsageTally::default();

    for record in records {
        tally.records += 1;
        match mode {
            AggregationMode::Direct => match (record.zone_id, record.visitor_count) {
                (Some(zone), Some(count)) => tally.usage.add(zone, count),
                _ => tally.skipped += 1,
            },
            AggregationMode::Distribution => {
                if record.visitor_count.is_none() {
                    tally.skipped += 1;
                }
                if let Some(distribution) = &record.distribution {
                    for (&zone, &count) in distribution {
                        tally.usage.add(zone, count);
                    }
                }
            }
        }
    }

    tally
}

/// Minimum, maximum and total over the zones of a usage. The total
/// saturates at `u64::MAX`.
///
/// # Errors
///
/// * [`AnalyticsError::EmptyAggregation`] if the usage has no zones
pub fn usage_stats(usage: &ZoneUsage) -> Result<UsageStats, AnalyticsError> {
    let mut counts = usage.iter().map(|(_, count)| count);
    let first = counts.next().ok_or(AnalyticsError::EmptyAggregation)?;

    Ok(counts.fold(
        UsageStats {
            min: first,
            max: first,
            sum: first,
        },
        |stats, count| UsageStats {
            min: stats.min.min(count),
            max: stats.max.max(count),
            sum: stats.sum.saturating_add(count),
        },
    ))
}

/// Maps `count` into `[0, 1]` relative to the usage range.
///
/// Counts outside `min..=max` map outside `[0, 1]`.
///
/// # Errors
///
/// * [`AnalyticsError::DegenerateRange`] if `min == max`
#[allow(clippy::cast_precision_loss)]
pub fn normalize(count: u64, stats: &UsageStats) -> Result<f64, AnalyticsError> {
    if stats.max == stats.min {
        return Err(AnalyticsError::DegenerateRange { value: stats.min });
    }
    let span = (stats.max - stats.min) as f64;
    Ok((count as f64 - stats.min as f64) / span)
}

/// Income rows passed through in source order.
#[must_use]
pub fn income_rows<'a>(stats: impl IntoIterator<Item = &'a IncomeStat>) -> Vec<IncomeStat> {
    stats.into_iter().cloned().collect()
}

/// Respondent count per education level. Rows with a malformed count add
/// nothing.
#[must_use]
pub fn education_totals<'a>(
    stats: impl IntoIterator<Item = &'a EducationStat>,
) -> BTreeMap<String, u64> {
    let mut totals = BTreeMap::new();
    for stat in stats {
        if let Some(count) = stat.count {
            let total = totals.entry(stat.education_level.clone()).or_insert(0_u64);
            *total = total.saturating_add(count);
        }
    }
    totals
}
