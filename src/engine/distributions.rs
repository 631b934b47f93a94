//! Food type, claim status and geographic distributions

use crate::model::{ClaimStatus, ReportKind};
use crate::normalizer::{apportion_percentages, asc_text, desc, percentage, rank, sums_to_hundred};
use crate::result::{InconsistentAggregate, NormalizedResult, ReportRow};
use crate::store::{DataAccessError, QueryDescriptor, QueryExecutor};
use serde::Serialize;

/// Label of the synthetic row summing every status
pub const TOTAL_LABEL: &str = "TOTAL";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodTypeShare {
    pub food_type: String,
    pub listing_count: u64,
    pub total_quantity: f64,
    pub percentage_of_total_quantity: f64,
}

impl ReportRow for FoodTypeShare {
    const COLUMNS: &'static [&'static str] = &[
        "food_type",
        "listing_count",
        "total_quantity",
        "percentage_of_total_quantity",
    ];
}

const FOOD_TYPES_SQL: &str = "
SELECT food_type,
       COUNT(*) AS listing_count,
       COALESCE(SUM(quantity), 0) AS total_quantity
FROM food_listings
GROUP BY food_type";

/// Listed quantity per food type and its share of all listed quantity
pub fn food_type_distribution<E: QueryExecutor + ?Sized>(
    store: &E,
    tolerance: f64,
) -> Result<NormalizedResult<FoodTypeShare>, DataAccessError> {
    let rows = store.execute(&QueryDescriptor::new("food_type_distribution", FOOD_TYPES_SQL))?;

    let mut groups = Vec::with_capacity(rows.len());
    for row in rows {
        groups.push((
            row.label("food_type")?,
            row.count("listing_count")?,
            row.f64("total_quantity")?,
        ));
    }

    let grand_total: f64 = groups.iter().map(|(_, _, quantity)| quantity).sum();
    let quantities: Vec<f64> = groups.iter().map(|(_, _, quantity)| *quantity).collect();
    let labels: Vec<&str> = groups.iter().map(|(food_type, _, _)| food_type.as_str()).collect();
    let apportioned = apportion_percentages(&quantities, &labels);

    let shares: Vec<FoodTypeShare> = groups
        .into_iter()
        .zip(apportioned)
        .map(|((food_type, listing_count, total_quantity), share)| FoodTypeShare {
            food_type,
            listing_count,
            total_quantity,
            percentage_of_total_quantity: share,
        })
        .collect();

    let mut advisories = Vec::new();
    // All-zero quantities legitimately give 0% everywhere
    if grand_total > 0.0 {
        let percentages: Vec<f64> = shares.iter().map(|s| s.percentage_of_total_quantity).collect();
        if !sums_to_hundred(&percentages, tolerance) {
            advisories.push(InconsistentAggregate::PercentageSumDrift {
                report: ReportKind::FoodTypeDistribution,
                sum: percentages.iter().sum(),
                tolerance,
            });
        }
    }

    let ranked = rank(shares, |a, b| {
        desc(a.total_quantity, b.total_quantity).then_with(|| asc_text(&a.food_type, &b.food_type))
    });

    log::debug!("🥕 food_type_distribution: {} food types", ranked.len());
    Ok(NormalizedResult::with_advisories(ranked, advisories))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimStatusCount {
    pub status: String,
    pub claim_count: u64,
    /// Share of all claims; the TOTAL row carries 100
    pub percentage: f64,
    /// Set only on the synthetic TOTAL row, which must be skipped when summing
    pub is_total: bool,
}

impl ReportRow for ClaimStatusCount {
    const COLUMNS: &'static [&'static str] = &["status", "claim_count", "percentage", "is_total"];
}

/// Sort position of a status: lifecycle order, then unknown statuses
fn lifecycle_position(status: &str) -> usize {
    ClaimStatus::from_str(status)
        .and_then(|known| ClaimStatus::all().iter().position(|s| *s == known))
        .unwrap_or(usize::MAX)
}

const CLAIM_STATUS_SQL: &str = "
SELECT status,
       COUNT(*) AS claim_count
FROM claims
GROUP BY status";

/// Claim counts per status followed by one TOTAL row
pub fn claim_status_distribution<E: QueryExecutor + ?Sized>(
    store: &E,
) -> Result<NormalizedResult<ClaimStatusCount>, DataAccessError> {
    let rows = store.execute(&QueryDescriptor::new("claim_status_distribution", CLAIM_STATUS_SQL))?;

    let mut counts = Vec::with_capacity(rows.len());
    for row in rows {
        counts.push((row.label("status")?, row.count("claim_count")?));
    }
    if counts.is_empty() {
        return Ok(NormalizedResult::from_rows(Vec::new()));
    }

    let total: u64 = counts.iter().map(|(_, count)| count).sum();
    let per_status: Vec<ClaimStatusCount> = counts
        .into_iter()
        .map(|(status, claim_count)| ClaimStatusCount {
            percentage: percentage(claim_count as f64, total as f64),
            status,
            claim_count,
            is_total: false,
        })
        .collect();

    let mut ranked = rank(per_status, |a, b| {
        b.claim_count
            .cmp(&a.claim_count)
            .then_with(|| lifecycle_position(&a.status).cmp(&lifecycle_position(&b.status)))
            .then_with(|| asc_text(&a.status, &b.status))
    });
    ranked.push(ClaimStatusCount {
        status: TOTAL_LABEL.to_string(),
        claim_count: total,
        percentage: percentage(total as f64, total as f64),
        is_total: true,
    });

    log::debug!("📊 claim_status_distribution: {} claims", total);
    Ok(NormalizedResult::from_rows(ranked))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityDistribution {
    pub city: String,
    pub provider_count: u64,
    pub listing_count: u64,
    pub total_listed: f64,
    /// Quantity of completed claims on listings in this city
    pub food_distributed: f64,
    /// Not clamped: above 100 means claims exceed listings
    pub food_utilization_rate: f64,
}

impl ReportRow for CityDistribution {
    const COLUMNS: &'static [&'static str] = &[
        "city",
        "provider_count",
        "listing_count",
        "total_listed",
        "food_distributed",
        "food_utilization_rate",
    ];
}

// Claims are pre-summed per listing so each listing's quantity is counted once
const GEOGRAPHIC_SQL: &str = "
SELECT p.city,
       COUNT(DISTINCT p.provider_id) AS provider_count,
       COUNT(f.food_id) AS listing_count,
       COALESCE(SUM(f.quantity), 0) AS total_listed,
       COALESCE(SUM(d.distributed), 0) AS food_distributed
FROM food_listings f
JOIN providers p ON p.provider_id = f.provider_id
LEFT JOIN (
    SELECT food_id, SUM(quantity_claimed) AS distributed
    FROM claims
    WHERE status = ?
    GROUP BY food_id
) d ON d.food_id = f.food_id
GROUP BY p.city";

/// Listed vs. distributed quantity per provider city
pub fn geographic_distribution<E: QueryExecutor + ?Sized>(
    store: &E,
) -> Result<NormalizedResult<CityDistribution>, DataAccessError> {
    let query = QueryDescriptor::new("geographic_distribution", GEOGRAPHIC_SQL)
        .bind(ClaimStatus::Completed.as_str());
    let rows = store.execute(&query)?;

    let mut cities = Vec::with_capacity(rows.len());
    let mut advisories = Vec::new();
    for row in rows {
        let city = row.label("city")?;
        let total_listed = row.f64("total_listed")?;
        let food_distributed = row.f64("food_distributed")?;
        let food_utilization_rate = percentage(food_distributed, total_listed);

        if food_distributed > total_listed {
            advisories.push(InconsistentAggregate::RateAboveCeiling {
                report: ReportKind::GeographicDistribution,
                subject: city.clone(),
                rate: food_utilization_rate,
                numerator: food_distributed,
                denominator: total_listed,
            });
        }

        cities.push(CityDistribution {
            city,
            provider_count: row.count("provider_count")?,
            listing_count: row.count("listing_count")?,
            total_listed,
            food_distributed,
            food_utilization_rate,
        });
    }

    let ranked = rank(cities, |a, b| {
        desc(a.food_distributed, b.food_distributed).then_with(|| asc_text(&a.city, &b.city))
    });

    log::debug!("🗺️  geographic_distribution: {} cities", ranked.len());
    Ok(NormalizedResult::with_advisories(ranked, advisories))
}
