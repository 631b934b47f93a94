//! System KPI synthesis
//!
//! Every metric is computed inside one read snapshot, so the headline numbers
//! describe a single data version even while claims keep arriving.

use crate::config::{ActiveProviderRule, ActiveReceiverRule, AnalyticsConfig};
use crate::engine::distributions::claim_status_distribution;
use crate::error::SynthesisError;
use crate::model::{ClaimStatus, ListingStatus, ReportKind};
use crate::normalizer::{percentage, success_rate};
use crate::result::{InconsistentAggregate, NormalizedResult, ReportRow};
use crate::store::{
    date_param, DataAccessError, DataStore, QueryDescriptor, QueryExecutor, ReadConsistency,
    Snapshot,
};
use chrono::{Days, NaiveDate};
use serde::Serialize;

pub const TOTAL_PROVIDERS: &str = "Total Providers";
pub const ACTIVE_PROVIDERS: &str = "Active Providers";
pub const TOTAL_RECEIVERS: &str = "Total Receivers";
pub const ACTIVE_RECEIVERS: &str = "Active Receivers";
pub const TOTAL_FOOD_ITEMS: &str = "Total Food Items";
pub const TOTAL_FOOD_QUANTITY: &str = "Total Food Quantity";
pub const TOTAL_CLAIMS: &str = "Total Claims";
pub const SUCCESSFUL_CLAIMS: &str = "Successful Claims";
pub const FOOD_DISTRIBUTED: &str = "Food Distributed";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemMetric {
    pub metric_name: String,
    pub metric_value: f64,
    pub percentage: Option<f64>,
}

impl SystemMetric {
    fn count(name: &str, value: u64) -> Self {
        Self {
            metric_name: name.to_string(),
            metric_value: value as f64,
            percentage: None,
        }
    }

    fn with_percentage(name: &str, value: f64, percentage: f64) -> Self {
        Self {
            metric_name: name.to_string(),
            metric_value: value,
            percentage: Some(percentage),
        }
    }
}

impl ReportRow for SystemMetric {
    const COLUMNS: &'static [&'static str] = &["metric_name", "metric_value", "percentage"];
}

/// The metrics table together with the consistency the store actually gave it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemMetrics {
    pub consistency: ReadConsistency,
    pub metrics: NormalizedResult<SystemMetric>,
}

impl SystemMetrics {
    pub fn get(&self, metric_name: &str) -> Option<&SystemMetric> {
        self.metrics.rows().iter().find(|m| m.metric_name == metric_name)
    }
}

const PROVIDERS_ANY_LISTING_SQL: &str = "
SELECT COUNT(*) AS total,
       COUNT(CASE WHEN EXISTS (
           SELECT 1 FROM food_listings f WHERE f.provider_id = p.provider_id
       ) THEN 1 END) AS active
FROM providers p";

const PROVIDERS_NON_EXPIRED_SQL: &str = "
SELECT COUNT(*) AS total,
       COUNT(CASE WHEN EXISTS (
           SELECT 1 FROM food_listings f WHERE f.provider_id = p.provider_id AND f.status <> ?
       ) THEN 1 END) AS active
FROM providers p";

const RECEIVERS_ANY_CLAIM_SQL: &str = "
SELECT COUNT(*) AS total,
       COUNT(CASE WHEN EXISTS (
           SELECT 1 FROM claims c WHERE c.receiver_id = r.receiver_id
       ) THEN 1 END) AS active
FROM receivers r";

const RECEIVERS_RECENT_CLAIM_SQL: &str = "
SELECT COUNT(*) AS total,
       COUNT(CASE WHEN EXISTS (
           SELECT 1 FROM claims c
           WHERE c.receiver_id = r.receiver_id
             AND date(c.claim_date) BETWEEN ? AND ?
       ) THEN 1 END) AS active
FROM receivers r";

// Listed and distributed quantity over the same listing set; completed claims
// are pre-summed per listing so a listing's quantity is counted once
const LISTINGS_SQL: &str = "
SELECT COUNT(*) AS total_items,
       COALESCE(SUM(f.quantity), 0) AS total_quantity,
       COALESCE(SUM(d.distributed), 0) AS food_distributed
FROM food_listings f
LEFT JOIN (
    SELECT food_id, SUM(quantity_claimed) AS distributed
    FROM claims
    WHERE status = ?
    GROUP BY food_id
) d ON d.food_id = f.food_id";

/// Composes the system-wide KPI table from the engine's computations
#[derive(Debug, Clone)]
pub struct KpiSynthesizer {
    active_provider_rule: ActiveProviderRule,
    active_receiver_rule: ActiveReceiverRule,
    as_of: NaiveDate,
}

impl KpiSynthesizer {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            active_provider_rule: config.active_provider_rule,
            active_receiver_rule: config.active_receiver_rule,
            as_of: config.as_of,
        }
    }

    /// Compute every metric against one snapshot; the first failure aborts the table
    pub fn synthesize(&self, store: &dyn DataStore) -> Result<SystemMetrics, SynthesisError> {
        let snapshot = store.snapshot().map_err(SynthesisError::Snapshot)?;
        let consistency = snapshot.consistency();
        if consistency == ReadConsistency::BestEffort {
            log::warn!("⚠️  Store offers best-effort reads only, system metrics may mix data versions");
        }
        let reader: &dyn Snapshot = &*snapshot;

        let (total_providers, active_providers) =
            self.providers(reader).map_err(metric_error(ACTIVE_PROVIDERS))?;
        let (total_receivers, active_receivers) =
            self.receivers(reader).map_err(metric_error(ACTIVE_RECEIVERS))?;
        let listed = listings(reader).map_err(metric_error(FOOD_DISTRIBUTED))?;
        let (total_items, total_quantity, food_distributed) =
            (listed.total_items, listed.total_quantity, listed.food_distributed);
        let (total_claims, completed_claims) =
            claim_totals(reader).map_err(metric_error(SUCCESSFUL_CLAIMS))?;

        let distributed_share = percentage(food_distributed, total_quantity);
        let mut advisories = Vec::new();
        if food_distributed > total_quantity {
            advisories.push(InconsistentAggregate::RateAboveCeiling {
                report: ReportKind::SystemMetrics,
                subject: FOOD_DISTRIBUTED.to_string(),
                rate: distributed_share,
                numerator: food_distributed,
                denominator: total_quantity,
            });
        }

        let metrics = vec![
            SystemMetric::count(TOTAL_PROVIDERS, total_providers),
            SystemMetric::with_percentage(
                ACTIVE_PROVIDERS,
                active_providers as f64,
                percentage(active_providers as f64, total_providers as f64),
            ),
            SystemMetric::count(TOTAL_RECEIVERS, total_receivers),
            SystemMetric::with_percentage(
                ACTIVE_RECEIVERS,
                active_receivers as f64,
                percentage(active_receivers as f64, total_receivers as f64),
            ),
            SystemMetric::count(TOTAL_FOOD_ITEMS, total_items),
            SystemMetric {
                metric_name: TOTAL_FOOD_QUANTITY.to_string(),
                metric_value: total_quantity,
                percentage: None,
            },
            SystemMetric::count(TOTAL_CLAIMS, total_claims),
            SystemMetric::with_percentage(
                SUCCESSFUL_CLAIMS,
                completed_claims as f64,
                success_rate(completed_claims, total_claims),
            ),
            SystemMetric::with_percentage(FOOD_DISTRIBUTED, food_distributed, distributed_share),
        ];

        log::info!(
            "📈 System metrics synthesized: {} providers, {} receivers, {} claims ({:?})",
            total_providers,
            total_receivers,
            total_claims,
            consistency
        );

        Ok(SystemMetrics {
            consistency,
            metrics: NormalizedResult::with_advisories(metrics, advisories),
        })
    }

    fn providers<E: QueryExecutor + ?Sized>(&self, reader: &E) -> Result<(u64, u64), DataAccessError> {
        let query = match self.active_provider_rule {
            ActiveProviderRule::AnyListing => {
                QueryDescriptor::new("system_metrics_providers", PROVIDERS_ANY_LISTING_SQL)
            }
            ActiveProviderRule::NonExpiredListing => {
                QueryDescriptor::new("system_metrics_providers", PROVIDERS_NON_EXPIRED_SQL)
                    .bind(ListingStatus::Expired.as_str())
            }
        };
        total_and_active(reader, &query)
    }

    fn receivers<E: QueryExecutor + ?Sized>(&self, reader: &E) -> Result<(u64, u64), DataAccessError> {
        let query = match self.active_receiver_rule {
            ActiveReceiverRule::AnyClaim => {
                QueryDescriptor::new("system_metrics_receivers", RECEIVERS_ANY_CLAIM_SQL)
            }
            ActiveReceiverRule::ClaimedWithinDays(days) => {
                let since = self
                    .as_of
                    .checked_sub_days(Days::new(u64::from(days)))
                    .unwrap_or(NaiveDate::MIN);
                QueryDescriptor::new("system_metrics_receivers", RECEIVERS_RECENT_CLAIM_SQL)
                    .bind(date_param(since))
                    .bind(date_param(self.as_of))
            }
        };
        total_and_active(reader, &query)
    }
}

fn metric_error(metric: &'static str) -> impl Fn(DataAccessError) -> SynthesisError {
    move |source| SynthesisError::Metric { metric, source }
}

fn total_and_active<E: QueryExecutor + ?Sized>(
    reader: &E,
    query: &QueryDescriptor,
) -> Result<(u64, u64), DataAccessError> {
    let rows = reader.execute(query)?;
    match rows.first() {
        Some(row) => Ok((row.count("total")?, row.count("active")?)),
        None => Ok((0, 0)),
    }
}

#[derive(Debug, Default)]
struct ListingTotals {
    total_items: u64,
    total_quantity: f64,
    food_distributed: f64,
}

fn listings<E: QueryExecutor + ?Sized>(reader: &E) -> Result<ListingTotals, DataAccessError> {
    let query = QueryDescriptor::new("system_metrics_listings", LISTINGS_SQL)
        .bind(ClaimStatus::Completed.as_str());
    let rows = reader.execute(&query)?;
    match rows.first() {
        Some(row) => Ok(ListingTotals {
            total_items: row.count("total_items")?,
            total_quantity: row.f64("total_quantity")?,
            food_distributed: row.f64("food_distributed")?,
        }),
        None => Ok(ListingTotals::default()),
    }
}

/// Total and completed claim counts, read off the claim status distribution
fn claim_totals<E: QueryExecutor + ?Sized>(reader: &E) -> Result<(u64, u64), DataAccessError> {
    let distribution = claim_status_distribution(reader)?;
    let mut total = 0;
    let mut completed = 0;
    for row in distribution.rows() {
        if row.is_total {
            total = row.claim_count;
        } else if ClaimStatus::from_str(&row.status).is_some_and(|s| s.is_success()) {
            completed += row.claim_count;
        }
    }
    Ok((total, completed))
}
