//! Filter-to-view derivation and its memoization.

use std::sync::Arc;

use mobility_map_analytics_models::{AggregateView, AggregationMode, FilterConfig};
use mobility_map_survey_models::SurveyDataset;

use crate::aggregate::{aggregate_usage, education_totals, income_rows, usage_stats};
use crate::color::zone_colors;
use crate::filter::{filter_education, filter_income, filter_visitors};

/// Computes the full dashboard view for a dataset and filter.
#[must_use]
pub fn derive(
    dataset: &SurveyDataset,
    filter: &FilterConfig,
    mode: AggregationMode,
) -> AggregateView {
    let tally = aggregate_usage(filter_visitors(&dataset.visitors, filter), mode);
    let stats = usage_stats(&tally.usage).ok();
    let colors = zone_colors(&tally.usage)
        .into_iter()
        .map(|(zone, color)| (zone, color.to_string()))
        .collect();

    log::debug!(
        "Derived view: {} of {} records matched, {} zones",
        tally.records,
        dataset.visitors.len(),
        tally.usage.len()
    );

    AggregateView {
        stats,
        colors,
        income: income_rows(filter_income(&dataset.income, filter)),
        education: education_totals(filter_education(&dataset.education, filter)),
        matched_records: tally.records,
        skipped_records: tally.skipped,
        usage: tally.usage,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    generation: u64,
    filter: FilterConfig,
    mode: AggregationMode,
}

/// Holds the view of the last `(dataset generation, filter, mode)` derived.
///
/// The dataset is identified by a generation number that the owner bumps
/// on every load; records themselves are never compared.
#[derive(Debug, Default)]
pub struct ViewCache {
    entry: Option<(CacheKey, Arc<AggregateView>)>,
}

impl ViewCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached view when the key is unchanged, otherwise derives
    /// a fresh one and replaces the cache.
    pub fn get_or_derive(
        &mut self,
        generation: u64,
        dataset: &SurveyDataset,
        filter: &FilterConfig,
        mode: AggregationMode,
    ) -> Arc<AggregateView> {
        let key = CacheKey {
            generation,
            filter: filter.clone(),
            mode,
        };

        if let Some((cached_key, view)) = &self.entry
            && *cached_key == key
        {
            return Arc::clone(view);
        }

        let view = Arc::new(derive(dataset, filter, mode));
        self.entry = Some((key, Arc::clone(&view)));
        view
    }

    /// Drops the cached view.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
