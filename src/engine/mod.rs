//! Aggregation engine
//!
//! One stateless computation per named report. The engine only holds a shared
//! store handle and the configuration, so clones can run reports on any number
//! of threads at once.

pub mod directory;
pub mod distributions;
pub mod rankings;

pub use directory::{
    ClaimFeedEntry, ClaimFilter, FilterOptions, FoodListingEntry, InventoryOverview, ListingFilter,
    ProviderFilter, ProviderSummary, RelationCounts,
};
pub use distributions::{CityDistribution, ClaimStatusCount, FoodTypeShare, TOTAL_LABEL};
pub use rankings::{ProviderSuccess, ReceiverClaimStats, ReceiverFilter};

use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, SynthesisError};
use crate::model::ReportKind;
use crate::result::NormalizedResult;
use crate::store::{DataAccessError, DataStore};
use crate::synthesizer::{KpiSynthesizer, SystemMetrics};
use std::sync::Arc;

#[derive(Clone)]
pub struct AggregationEngine {
    store: Arc<dyn DataStore>,
    config: AnalyticsConfig,
}

impl AggregationEngine {
    pub fn new(store: Arc<dyn DataStore>, config: AnalyticsConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn top_food_claimers(&self) -> Result<NormalizedResult<ReceiverClaimStats>, DataAccessError> {
        self.top_food_claimers_filtered(&ReceiverFilter::default())
    }

    pub fn top_food_claimers_filtered(
        &self,
        filter: &ReceiverFilter,
    ) -> Result<NormalizedResult<ReceiverClaimStats>, DataAccessError> {
        rankings::top_food_claimers(self.store.as_ref(), filter)
    }

    pub fn food_type_distribution(&self) -> Result<NormalizedResult<FoodTypeShare>, DataAccessError> {
        distributions::food_type_distribution(self.store.as_ref(), self.config.percentage_sum_tolerance)
    }

    pub fn successful_providers(&self) -> Result<NormalizedResult<ProviderSuccess>, DataAccessError> {
        rankings::successful_providers(self.store.as_ref())
    }

    pub fn claim_status_distribution(
        &self,
    ) -> Result<NormalizedResult<ClaimStatusCount>, DataAccessError> {
        distributions::claim_status_distribution(self.store.as_ref())
    }

    pub fn geographic_distribution(
        &self,
    ) -> Result<NormalizedResult<CityDistribution>, DataAccessError> {
        distributions::geographic_distribution(self.store.as_ref())
    }

    pub fn system_metrics(&self) -> Result<SystemMetrics, SynthesisError> {
        KpiSynthesizer::new(&self.config).synthesize(self.store.as_ref())
    }

    pub fn provider_directory(
        &self,
        filter: &ProviderFilter,
    ) -> Result<NormalizedResult<ProviderSummary>, DataAccessError> {
        directory::provider_directory(self.store.as_ref(), filter)
    }

    pub fn food_inventory(
        &self,
        filter: &ListingFilter,
    ) -> Result<NormalizedResult<FoodListingEntry>, DataAccessError> {
        directory::food_inventory(self.store.as_ref(), filter)
    }

    /// Inventory counts as of the configured report date
    pub fn inventory_overview(&self) -> Result<NormalizedResult<InventoryOverview>, DataAccessError> {
        directory::inventory_overview(
            self.store.as_ref(),
            self.config.as_of,
            self.config.expiring_soon_days,
        )
    }

    pub fn claims_feed(&self, filter: &ClaimFilter) -> Result<NormalizedResult<ClaimFeedEntry>, DataAccessError> {
        directory::claims_feed(self.store.as_ref(), filter)
    }

    pub fn filter_options(&self) -> Result<FilterOptions, DataAccessError> {
        directory::filter_options(self.store.as_ref())
    }

    pub fn relation_counts(&self) -> Result<RelationCounts, DataAccessError> {
        directory::relation_counts(self.store.as_ref())
    }

    /// Run a report with default filters and return it as JSON
    pub fn run(&self, kind: ReportKind) -> Result<serde_json::Value, AnalyticsError> {
        log::debug!("▶️  Running report {}", kind);
        let value = match kind {
            ReportKind::TopFoodClaimers => serde_json::to_value(self.top_food_claimers()?)?,
            ReportKind::FoodTypeDistribution => serde_json::to_value(self.food_type_distribution()?)?,
            ReportKind::SuccessfulProviders => serde_json::to_value(self.successful_providers()?)?,
            ReportKind::ClaimStatusDistribution => {
                serde_json::to_value(self.claim_status_distribution()?)?
            }
            ReportKind::GeographicDistribution => {
                serde_json::to_value(self.geographic_distribution()?)?
            }
            ReportKind::SystemMetrics => serde_json::to_value(self.system_metrics()?)?,
            ReportKind::ProviderDirectory => {
                serde_json::to_value(self.provider_directory(&ProviderFilter::default())?)?
            }
            ReportKind::FoodInventory => {
                serde_json::to_value(self.food_inventory(&ListingFilter::default())?)?
            }
            ReportKind::InventoryOverview => serde_json::to_value(self.inventory_overview()?)?,
            ReportKind::ClaimsFeed => serde_json::to_value(self.claims_feed(&ClaimFilter::default())?)?,
            ReportKind::FilterOptions => serde_json::to_value(self.filter_options()?)?,
            ReportKind::RelationCounts => serde_json::to_value(self.relation_counts()?)?,
        };
        Ok(value)
    }

    /// Dispatch by report name
    pub fn run_named(&self, name: &str) -> Result<serde_json::Value, AnalyticsError> {
        let kind = ReportKind::from_str(name.trim())
            .ok_or_else(|| AnalyticsError::UnknownReport(name.to_string()))?;
        self.run(kind)
    }
}

impl std::fmt::Debug for AggregationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregationEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
