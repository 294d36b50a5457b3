#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dashboard state for the mobility map.
//!
//! [`Dashboard`] owns the loaded survey dataset, the current filter and the
//! zone polygons. Every filter change is followed by a fresh derivation of
//! the aggregate view (memoized, so repeated renders with the same filter
//! are free), and [`Dashboard::render`] pushes the colored zones to the
//! host's overlay sink.

pub mod config;
pub mod controls;
pub mod overlay;

use std::sync::Arc;

use geojson::FeatureCollection;
use mobility_map_analytics::derive::ViewCache;
use mobility_map_analytics::playback::Playback;
use mobility_map_analytics_models::{AggregateView, AggregationMode, DateWindow, FilterConfig};
use mobility_map_geography::{GeographyError, parse_feature_collection, reproject_polygons};
use mobility_map_survey::{SurveyError, SurveyFormat, load_dataset};
use mobility_map_survey_models::{Gender, SurveyDataset, VisitorType};
use thiserror::Error;

pub use config::{DashboardConfig, PlaybackConfig};
pub use controls::{SelectControl, SelectOption, gender_select, visitor_type_select};
pub use overlay::{OverlayError, OverlayHandle, OverlayLayers, OverlaySink};

/// Overlay layer holding the colored zone polygons.
pub const ZONES_LAYER: &str = "zones";

/// Errors that can occur while running the dashboard.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Loading or parsing survey data failed.
    #[error(transparent)]
    Survey(#[from] SurveyError),

    /// Zone polygons could not be parsed or reprojected.
    #[error(transparent)]
    Geography(#[from] GeographyError),

    /// The host renderer rejected an overlay.
    #[error(transparent)]
    Overlay(#[from] OverlayError),

    /// The configuration TOML is invalid.
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O error (config file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A select control received a label it does not offer.
    #[error("Unknown option '{label}'")]
    UnknownOption {
        /// The rejected label.
        label: String,
    },
}

/// Initializes `pretty_env_logger` from `RUST_LOG`.
///
/// Safe to call more than once; later calls keep the first logger.
pub fn init_logger() {
    pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .try_init()
        .ok(); // Ignore error if logger was already set (e.g., in tests)
}

/// How a survey layout is aggregated.
#[must_use]
pub const fn aggregation_mode(format: SurveyFormat) -> AggregationMode {
    match format {
        SurveyFormat::Simple => AggregationMode::Direct,
        SurveyFormat::Extended => AggregationMode::Distribution,
    }
}

/// Where the survey dataset is in its lifecycle.
#[derive(Debug, Clone, Default)]
pub enum DataState {
    /// Nothing loaded yet.
    #[default]
    NotLoaded,
    Loaded(Arc<SurveyDataset>),
    /// The last load failed with this message.
    Failed(String),
}

impl DataState {
    #[must_use]
    pub fn dataset(&self) -> Option<&SurveyDataset> {
        match self {
            Self::Loaded(dataset) => Some(dataset.as_ref()),
            Self::NotLoaded | Self::Failed(_) => None,
        }
    }
}

/// The dashboard: data, filter, cached view and rendered overlays.
#[derive(Debug)]
pub struct Dashboard {
    config: DashboardConfig,
    data: DataState,
    /// Bumped on every dataset change; keys the view cache.
    generation: u64,
    filter: FilterConfig,
    cache: ViewCache,
    zones: Option<FeatureCollection>,
    layers: OverlayLayers,
    playback: Option<Playback>,
}

impl Dashboard {
    #[must_use]
    pub fn new(config: DashboardConfig) -> Self {
        let filter = config.initial_filter();
        let playback = config
            .playback
            .as_ref()
            .map(|playback| Playback::new(playback.start, playback.end));

        Self {
            config,
            data: DataState::NotLoaded,
            generation: 0,
            filter,
            cache: ViewCache::new(),
            zones: None,
            layers: OverlayLayers::new(),
            playback,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &DashboardConfig {
        &self.config
    }

    #[must_use]
    pub const fn data(&self) -> &DataState {
        &self.data
    }

    #[must_use]
    pub const fn filter(&self) -> &FilterConfig {
        &self.filter
    }

    #[must_use]
    pub const fn zones(&self) -> Option<&FeatureCollection> {
        self.zones.as_ref()
    }

    #[must_use]
    pub const fn aggregation_mode(&self) -> AggregationMode {
        aggregation_mode(self.config.data.format)
    }

    /// Loads the survey dataset and, when configured, the zone polygons.
    ///
    /// On failure the dashboard is left in [`DataState::Failed`] and keeps
    /// deriving empty views.
    ///
    /// # Errors
    ///
    /// * If any survey source cannot be loaded
    /// * If the zone source cannot be read or is not a feature collection
    pub async fn load(&mut self) -> Result<(), DashboardError> {
        match self.try_load().await {
            Ok((dataset, zones)) => {
                self.set_dataset(dataset);
                if zones.is_some() {
                    self.zones = zones;
                }
                Ok(())
            }
            Err(e) => {
                log::warn!("Failed to load dashboard data: {e}");
                self.data = DataState::Failed(e.to_string());
                self.bump_generation();
                Err(e)
            }
        }
    }

    async fn try_load(
        &self,
    ) -> Result<(SurveyDataset, Option<FeatureCollection>), DashboardError> {
        let dataset = load_dataset(&self.config.data).await?;

        let zones = match &self.config.zones {
            Some(source) => {
                let text = source.fetch_text(&reqwest::Client::new()).await?;
                let zones = parse_feature_collection(&text)?;
                log::info!("Loaded {} zones from {}", zones.features.len(), source.name());
                Some(zones)
            }
            None => None,
        };

        Ok((dataset, zones))
    }

    /// Replaces the dataset.
    pub fn set_dataset(&mut self, dataset: SurveyDataset) {
        if !dataset.malformed.is_empty() {
            log::warn!(
                "{} malformed values in survey data (first: {})",
                dataset.malformed.len(),
                dataset.malformed[0]
            );
        }
        self.data = DataState::Loaded(Arc::new(dataset));
        self.bump_generation();
    }

    /// Replaces the zone polygons.
    pub fn set_zones(&mut self, zones: FeatureCollection) {
        self.zones = Some(zones);
    }

    fn bump_generation(&mut self) {
        self.generation += 1;
        self.cache.invalidate();
    }

    pub fn set_filter(&mut self, filter: FilterConfig) {
        log::debug!("Filter changed: {filter:?}");
        self.filter = filter;
    }

    pub fn set_age_range(&mut self, age_from: i32, age_to: i32) {
        self.set_filter(FilterConfig {
            age_from,
            age_to,
            ..self.filter.clone()
        });
    }

    pub fn set_gender(&mut self, gender: Option<Gender>) {
        self.set_filter(FilterConfig {
            gender,
            ..self.filter.clone()
        });
    }

    pub fn set_visitor_type(&mut self, visitor_type: Option<VisitorType>) {
        self.set_filter(FilterConfig {
            visitor_type,
            ..self.filter.clone()
        });
    }

    pub fn set_date_window(&mut self, date_window: Option<DateWindow>) {
        self.set_filter(FilterConfig {
            date_window,
            ..self.filter.clone()
        });
    }

    /// Gender dropdown reflecting the current filter.
    #[must_use]
    pub fn gender_control(&self) -> SelectControl<Gender> {
        gender_select(self.filter.gender)
    }

    /// Visitor type dropdown reflecting the current filter.
    #[must_use]
    pub fn visitor_type_control(&self) -> SelectControl<VisitorType> {
        visitor_type_select(self.filter.visitor_type)
    }

    /// Applies a change event from the gender dropdown.
    ///
    /// # Errors
    ///
    /// * [`DashboardError::UnknownOption`] if the label is not offered
    pub fn select_gender(&mut self, label: &str) -> Result<(), DashboardError> {
        let gender = self.gender_control().on_change(label)?;
        self.set_gender(gender);
        Ok(())
    }

    /// Applies a change event from the visitor type dropdown.
    ///
    /// # Errors
    ///
    /// * [`DashboardError::UnknownOption`] if the label is not offered
    pub fn select_visitor_type(&mut self, label: &str) -> Result<(), DashboardError> {
        let visitor_type = self.visitor_type_control().on_change(label)?;
        self.set_visitor_type(visitor_type);
        Ok(())
    }

    /// Host timer interval for playback, when playback is configured.
    #[must_use]
    pub fn playback_tick_ms(&self) -> Option<u64> {
        self.config.playback.as_ref().map(|playback| playback.tick_ms)
    }

    /// Advances playback one hour and filters to the new window. Returns
    /// `None` when playback is not configured.
    pub fn advance_playback(&mut self) -> Option<DateWindow> {
        let window = self.playback.as_mut()?.tick();
        self.set_date_window(Some(window));
        Some(window)
    }

    /// The aggregate view for the current dataset and filter. Empty until
    /// a dataset is loaded.
    pub fn view(&mut self) -> Arc<AggregateView> {
        let mode = self.aggregation_mode();
        match &self.data {
            DataState::Loaded(dataset) => {
                self.cache
                    .get_or_derive(self.generation, dataset, &self.filter, mode)
            }
            DataState::NotLoaded | DataState::Failed(_) => Arc::new(AggregateView::default()),
        }
    }

    /// Reprojects the zones, colored by the current view, and shows them
    /// on [`ZONES_LAYER`].
    ///
    /// Returns `None` without touching the sink when there are no zones or
    /// no project context.
    ///
    /// # Errors
    ///
    /// * If a zone is not a polygon or cannot be projected
    /// * If the host rejects the overlay
    pub async fn render(
        &mut self,
        sink: &dyn OverlaySink,
    ) -> Result<Option<OverlayHandle>, DashboardError> {
        let view = self.view();

        let (Some(zones), Some(project)) = (&self.zones, &self.config.project) else {
            log::debug!("Nothing to render: zones or project context missing");
            return Ok(None);
        };

        let projected = reproject_polygons(zones, project, Some(&view.colors))?;
        let handle = self.layers.show(sink, ZONES_LAYER, &projected).await?;

        log::info!(
            "Rendered {} zones ({} with visitors)",
            projected.features.len(),
            view.usage.len()
        );

        Ok(Some(handle))
    }

    /// Removes the zones overlay.
    ///
    /// # Errors
    ///
    /// * If the host rejects the removal
    pub async fn clear(&mut self, sink: &dyn OverlaySink) -> Result<bool, DashboardError> {
        Ok(self.layers.clear(sink, ZONES_LAYER).await?)
    }
}
