//! Receiver and provider rankings

use crate::model::ClaimStatus;
use crate::normalizer::{asc_text, desc, rank, success_rate};
use crate::result::{NormalizedResult, ReportRow};
use crate::store::{like_contains, DataAccessError, QueryExecutor, SqlBuilder};
use serde::Serialize;

/// One receiver in the top food claimers ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiverClaimStats {
    pub receiver_id: i64,
    pub receiver_name: String,
    pub receiver_type: String,
    pub city: String,
    pub total_claims: u64,
    pub completed_claims: u64,
    /// Quantity of completed claims only
    pub total_food_received: f64,
    pub success_rate_percentage: f64,
}

impl ReportRow for ReceiverClaimStats {
    const COLUMNS: &'static [&'static str] = &[
        "receiver_id",
        "receiver_name",
        "receiver_type",
        "city",
        "total_claims",
        "completed_claims",
        "total_food_received",
        "success_rate_percentage",
    ];
}

/// Optional restrictions on the receiver ranking. All text is bound, never spliced.
#[derive(Debug, Clone, Default)]
pub struct ReceiverFilter {
    pub name_contains: Option<String>,
    pub city: Option<String>,
    pub receiver_type: Option<String>,
    pub min_claims: Option<u64>,
}

const TOP_CLAIMERS_SQL: &str = "
SELECT r.receiver_id,
       r.name AS receiver_name,
       r.type AS receiver_type,
       r.city,
       COUNT(c.claim_id) AS total_claims,
       COUNT(CASE WHEN c.status = ? THEN 1 END) AS completed_claims,
       COALESCE(SUM(CASE WHEN c.status = ? THEN c.quantity_claimed END), 0) AS total_food_received
FROM claims c
JOIN receivers r ON r.receiver_id = c.receiver_id";

/// Receivers ranked by food received, then claim count, then name
pub fn top_food_claimers<E: QueryExecutor + ?Sized>(
    store: &E,
    filter: &ReceiverFilter,
) -> Result<NormalizedResult<ReceiverClaimStats>, DataAccessError> {
    let completed = ClaimStatus::Completed.as_str();
    let mut sql = SqlBuilder::new("top_food_claimers", TOP_CLAIMERS_SQL);
    sql.bind(completed).bind(completed);

    if let Some(term) = &filter.name_contains {
        sql.filter("r.name LIKE ? ESCAPE '\\'", vec![like_contains(term)]);
    }
    if let Some(city) = &filter.city {
        sql.filter("r.city = ?", vec![city.as_str().into()]);
    }
    if let Some(kind) = &filter.receiver_type {
        sql.filter("r.type = ?", vec![kind.as_str().into()]);
    }
    sql.tail("GROUP BY r.receiver_id, r.name, r.type, r.city");
    if let Some(min_claims) = filter.min_claims {
        let min_claims = i64::try_from(min_claims).unwrap_or(i64::MAX);
        sql.tail("HAVING COUNT(c.claim_id) >= ?").bind(min_claims);
    }

    let rows = store.execute(&sql.build())?;

    let mut stats = Vec::with_capacity(rows.len());
    for row in rows {
        let total_claims = row.count("total_claims")?;
        let completed_claims = row.count("completed_claims")?;
        stats.push(ReceiverClaimStats {
            receiver_id: row.i64("receiver_id")?,
            receiver_name: row.label("receiver_name")?,
            receiver_type: row.label("receiver_type")?,
            city: row.label("city")?,
            total_claims,
            completed_claims,
            total_food_received: row.f64("total_food_received")?,
            success_rate_percentage: success_rate(completed_claims, total_claims),
        });
    }

    let ranked = rank(stats, |a, b| {
        desc(a.total_food_received, b.total_food_received)
            .then_with(|| b.total_claims.cmp(&a.total_claims))
            .then_with(|| asc_text(&a.receiver_name, &b.receiver_name))
            .then_with(|| a.receiver_id.cmp(&b.receiver_id))
    });

    log::debug!("🏆 top_food_claimers: {} receivers ranked", ranked.len());
    Ok(NormalizedResult::from_rows(ranked))
}

/// One provider in the successful providers ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSuccess {
    pub provider_id: i64,
    pub provider_name: String,
    pub provider_type: String,
    pub city: String,
    pub total_claims: u64,
    pub successful_claims: u64,
    pub success_rate_percentage: f64,
}

impl ReportRow for ProviderSuccess {
    const COLUMNS: &'static [&'static str] = &[
        "provider_id",
        "provider_name",
        "provider_type",
        "city",
        "total_claims",
        "successful_claims",
        "success_rate_percentage",
    ];
}

// Inner joins: providers without claims never reach the ranking
const SUCCESSFUL_PROVIDERS_SQL: &str = "
SELECT p.provider_id,
       p.name AS provider_name,
       p.type AS provider_type,
       p.city,
       COUNT(c.claim_id) AS total_claims,
       COUNT(CASE WHEN c.status = ? THEN 1 END) AS successful_claims
FROM claims c
JOIN food_listings f ON f.food_id = c.food_id
JOIN providers p ON p.provider_id = f.provider_id
GROUP BY p.provider_id, p.name, p.type, p.city";

/// Providers with at least one claim, ranked by completed claims
pub fn successful_providers<E: QueryExecutor + ?Sized>(
    store: &E,
) -> Result<NormalizedResult<ProviderSuccess>, DataAccessError> {
    let mut sql = SqlBuilder::new("successful_providers", SUCCESSFUL_PROVIDERS_SQL);
    sql.bind(ClaimStatus::Completed.as_str());

    let rows = store.execute(&sql.build())?;

    let mut providers = Vec::with_capacity(rows.len());
    for row in rows {
        let total_claims = row.count("total_claims")?;
        if total_claims == 0 {
            continue;
        }
        let successful_claims = row.count("successful_claims")?;
        providers.push(ProviderSuccess {
            provider_id: row.i64("provider_id")?,
            provider_name: row.label("provider_name")?,
            provider_type: row.label("provider_type")?,
            city: row.label("city")?,
            total_claims,
            successful_claims,
            success_rate_percentage: success_rate(successful_claims, total_claims),
        });
    }

    let ranked = rank(providers, |a, b| {
        b.successful_claims
            .cmp(&a.successful_claims)
            .then_with(|| desc(a.success_rate_percentage, b.success_rate_percentage))
            .then_with(|| asc_text(&a.provider_name, &b.provider_name))
            .then_with(|| a.provider_id.cmp(&b.provider_id))
    });

    log::debug!("🏆 successful_providers: {} providers ranked", ranked.len());
    Ok(NormalizedResult::from_rows(ranked))
}
