//! Filtered read-path listings: provider directory, food inventory, claims feed,
//! filter facets and relation counts

use crate::model::{ClaimStatus, ListingStatus};
use crate::normalizer::{asc_text, desc, rank, success_rate};
use crate::result::{NormalizedResult, ReportRow};
use crate::store::{
    date_param, like_contains, DataAccessError, QueryDescriptor, QueryExecutor, SqlBuilder,
};
use chrono::{Days, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSummary {
    pub provider_id: i64,
    pub name: String,
    pub provider_type: String,
    pub city: String,
    pub address: Option<String>,
    pub contact: Option<String>,
    pub total_food_items: u64,
    pub total_quantity: f64,
    pub total_claims: u64,
    pub successful_claims: u64,
    pub success_rate_percentage: f64,
}

impl ReportRow for ProviderSummary {
    const COLUMNS: &'static [&'static str] = &[
        "provider_id",
        "name",
        "provider_type",
        "city",
        "address",
        "contact",
        "total_food_items",
        "total_quantity",
        "total_claims",
        "successful_claims",
        "success_rate_percentage",
    ];
}

#[derive(Debug, Clone, Default)]
pub struct ProviderFilter {
    pub name_contains: Option<String>,
    pub city: Option<String>,
    pub provider_type: Option<String>,
}

// Listings and claims are aggregated separately so claim fan-out never
// multiplies listing quantity
const PROVIDER_DIRECTORY_SQL: &str = "
SELECT p.provider_id,
       p.name,
       p.type AS provider_type,
       p.city,
       p.address,
       p.contact,
       COALESCE(l.total_food_items, 0) AS total_food_items,
       COALESCE(l.total_quantity, 0) AS total_quantity,
       COALESCE(k.total_claims, 0) AS total_claims,
       COALESCE(k.successful_claims, 0) AS successful_claims
FROM providers p
LEFT JOIN (
    SELECT provider_id, COUNT(*) AS total_food_items, SUM(quantity) AS total_quantity
    FROM food_listings
    GROUP BY provider_id
) l ON l.provider_id = p.provider_id
LEFT JOIN (
    SELECT f.provider_id,
           COUNT(*) AS total_claims,
           COUNT(CASE WHEN c.status = ? THEN 1 END) AS successful_claims
    FROM claims c
    JOIN food_listings f ON f.food_id = c.food_id
    GROUP BY f.provider_id
) k ON k.provider_id = p.provider_id";

/// Every matching provider with listing and claim totals, largest donors first
pub fn provider_directory<E: QueryExecutor + ?Sized>(
    store: &E,
    filter: &ProviderFilter,
) -> Result<NormalizedResult<ProviderSummary>, DataAccessError> {
    let mut sql = SqlBuilder::new("provider_directory", PROVIDER_DIRECTORY_SQL);
    sql.bind(ClaimStatus::Completed.as_str());

    if let Some(term) = &filter.name_contains {
        sql.filter("p.name LIKE ? ESCAPE '\\'", vec![like_contains(term)]);
    }
    if let Some(city) = &filter.city {
        sql.filter("p.city = ?", vec![city.as_str().into()]);
    }
    if let Some(kind) = &filter.provider_type {
        sql.filter("p.type = ?", vec![kind.as_str().into()]);
    }

    let rows = store.execute(&sql.build())?;

    let mut providers = Vec::with_capacity(rows.len());
    for row in rows {
        let total_claims = row.count("total_claims")?;
        let successful_claims = row.count("successful_claims")?;
        providers.push(ProviderSummary {
            provider_id: row.i64("provider_id")?,
            name: row.label("name")?,
            provider_type: row.label("provider_type")?,
            city: row.label("city")?,
            address: row.opt_text("address")?,
            contact: row.opt_text("contact")?,
            total_food_items: row.count("total_food_items")?,
            total_quantity: row.f64("total_quantity")?,
            total_claims,
            successful_claims,
            success_rate_percentage: success_rate(successful_claims, total_claims),
        });
    }

    let ranked = rank(providers, |a, b| {
        desc(a.total_quantity, b.total_quantity)
            .then_with(|| asc_text(&a.name, &b.name))
            .then_with(|| a.provider_id.cmp(&b.provider_id))
    });

    log::debug!("🏪 provider_directory: {} providers", ranked.len());
    Ok(NormalizedResult::from_rows(ranked))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodListingEntry {
    pub food_id: i64,
    pub food_name: String,
    pub food_type: String,
    pub quantity: f64,
    pub unit: Option<String>,
    pub expiry_date: Option<String>,
    pub status: String,
    pub provider_id: i64,
    pub provider_name: String,
    pub city: String,
    pub provider_contact: Option<String>,
}

impl ReportRow for FoodListingEntry {
    const COLUMNS: &'static [&'static str] = &[
        "food_id",
        "food_name",
        "food_type",
        "quantity",
        "unit",
        "expiry_date",
        "status",
        "provider_id",
        "provider_name",
        "city",
        "provider_contact",
    ];
}

#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub name_contains: Option<String>,
    pub food_type: Option<String>,
    pub status: Option<ListingStatus>,
    pub city: Option<String>,
}

const FOOD_INVENTORY_SQL: &str = "
SELECT f.food_id,
       f.name AS food_name,
       f.food_type,
       f.quantity,
       f.unit,
       f.expiry_date,
       f.status,
       p.provider_id,
       p.name AS provider_name,
       p.city,
       p.contact AS provider_contact
FROM food_listings f
JOIN providers p ON p.provider_id = f.provider_id";

/// Listings with their provider, soonest expiry first
pub fn food_inventory<E: QueryExecutor + ?Sized>(
    store: &E,
    filter: &ListingFilter,
) -> Result<NormalizedResult<FoodListingEntry>, DataAccessError> {
    let mut sql = SqlBuilder::new("food_inventory", FOOD_INVENTORY_SQL);

    if let Some(term) = &filter.name_contains {
        sql.filter("f.name LIKE ? ESCAPE '\\'", vec![like_contains(term)]);
    }
    if let Some(food_type) = &filter.food_type {
        sql.filter("f.food_type = ?", vec![food_type.as_str().into()]);
    }
    if let Some(status) = filter.status {
        sql.filter("f.status = ?", vec![status.as_str().into()]);
    }
    if let Some(city) = &filter.city {
        sql.filter("p.city = ?", vec![city.as_str().into()]);
    }
    sql.tail("ORDER BY f.expiry_date ASC, f.food_id ASC");

    let rows = store.execute(&sql.build())?;

    let mut listings = Vec::with_capacity(rows.len());
    for row in rows {
        listings.push(FoodListingEntry {
            food_id: row.i64("food_id")?,
            food_name: row.label("food_name")?,
            food_type: row.label("food_type")?,
            quantity: row.f64("quantity")?,
            unit: row.opt_text("unit")?,
            expiry_date: row.opt_text("expiry_date")?,
            status: row.label("status")?,
            provider_id: row.i64("provider_id")?,
            provider_name: row.label("provider_name")?,
            city: row.label("city")?,
            provider_contact: row.opt_text("provider_contact")?,
        });
    }

    Ok(NormalizedResult::from_rows(listings))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryOverview {
    pub total_items: u64,
    pub available_items: u64,
    /// Not yet expired, expiring between `as_of` and `as_of + horizon` inclusive
    pub expiring_soon: u64,
    pub expired_items: u64,
}

impl ReportRow for InventoryOverview {
    const COLUMNS: &'static [&'static str] =
        &["total_items", "available_items", "expiring_soon", "expired_items"];
}

const INVENTORY_OVERVIEW_SQL: &str = "
SELECT COUNT(*) AS total_items,
       COUNT(CASE WHEN status = ? THEN 1 END) AS available_items,
       COUNT(CASE WHEN status <> ? AND date(expiry_date) BETWEEN ? AND ? THEN 1 END) AS expiring_soon,
       COUNT(CASE WHEN status = ? THEN 1 END) AS expired_items
FROM food_listings";

/// Inventory headline counts relative to `as_of`
pub fn inventory_overview<E: QueryExecutor + ?Sized>(
    store: &E,
    as_of: NaiveDate,
    horizon_days: u32,
) -> Result<NormalizedResult<InventoryOverview>, DataAccessError> {
    let horizon_end = as_of
        .checked_add_days(Days::new(u64::from(horizon_days)))
        .unwrap_or(NaiveDate::MAX);
    let query = QueryDescriptor::new("inventory_overview", INVENTORY_OVERVIEW_SQL)
        .bind(ListingStatus::Available.as_str())
        .bind(ListingStatus::Expired.as_str())
        .bind(date_param(as_of))
        .bind(date_param(horizon_end))
        .bind(ListingStatus::Expired.as_str());

    let rows = store.execute(&query)?;

    let mut overview = Vec::with_capacity(1);
    for row in rows {
        let total_items = row.count("total_items")?;
        if total_items == 0 {
            continue;
        }
        overview.push(InventoryOverview {
            total_items,
            available_items: row.count("available_items")?,
            expiring_soon: row.count("expiring_soon")?,
            expired_items: row.count("expired_items")?,
        });
    }

    Ok(NormalizedResult::from_rows(overview))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimFeedEntry {
    pub claim_id: i64,
    pub claim_date: Option<String>,
    pub status: String,
    pub quantity_claimed: f64,
    pub receiver_id: i64,
    pub receiver_name: String,
    pub food_id: i64,
    pub food_name: String,
    pub quantity_available: f64,
    pub provider_id: i64,
    pub provider_name: String,
}

impl ReportRow for ClaimFeedEntry {
    const COLUMNS: &'static [&'static str] = &[
        "claim_id",
        "claim_date",
        "status",
        "quantity_claimed",
        "receiver_id",
        "receiver_name",
        "food_id",
        "food_name",
        "quantity_available",
        "provider_id",
        "provider_name",
    ];
}

#[derive(Debug, Clone, Default)]
pub struct ClaimFilter {
    pub status: Option<ClaimStatus>,
    /// Inclusive lower bound on the claim's calendar date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the claim's calendar date
    pub to: Option<NaiveDate>,
    pub receiver_name_contains: Option<String>,
    pub provider_name_contains: Option<String>,
    pub limit: Option<u32>,
}

const CLAIMS_FEED_SQL: &str = "
SELECT c.claim_id,
       c.claim_date,
       c.status,
       c.quantity_claimed,
       r.receiver_id,
       r.name AS receiver_name,
       f.food_id,
       f.name AS food_name,
       f.quantity AS quantity_available,
       p.provider_id,
       p.name AS provider_name
FROM claims c
JOIN receivers r ON r.receiver_id = c.receiver_id
JOIN food_listings f ON f.food_id = c.food_id
JOIN providers p ON p.provider_id = f.provider_id";

/// Claims with their receiver, listing and provider, most recent first
pub fn claims_feed<E: QueryExecutor + ?Sized>(
    store: &E,
    filter: &ClaimFilter,
) -> Result<NormalizedResult<ClaimFeedEntry>, DataAccessError> {
    let mut sql = SqlBuilder::new("claims_feed", CLAIMS_FEED_SQL);

    if let Some(status) = filter.status {
        sql.filter("c.status = ?", vec![status.as_str().into()]);
    }
    if let Some(from) = filter.from {
        sql.filter("date(c.claim_date) >= ?", vec![date_param(from)]);
    }
    if let Some(to) = filter.to {
        sql.filter("date(c.claim_date) <= ?", vec![date_param(to)]);
    }
    if let Some(term) = &filter.receiver_name_contains {
        sql.filter("r.name LIKE ? ESCAPE '\\'", vec![like_contains(term)]);
    }
    if let Some(term) = &filter.provider_name_contains {
        sql.filter("p.name LIKE ? ESCAPE '\\'", vec![like_contains(term)]);
    }
    sql.tail("ORDER BY c.claim_date DESC, c.claim_id DESC");
    if let Some(limit) = filter.limit {
        sql.tail("LIMIT ?").bind(i64::from(limit));
    }

    let rows = store.execute(&sql.build())?;

    let mut claims = Vec::with_capacity(rows.len());
    for row in rows {
        claims.push(ClaimFeedEntry {
            claim_id: row.i64("claim_id")?,
            claim_date: row.opt_text("claim_date")?,
            status: row.label("status")?,
            quantity_claimed: row.f64("quantity_claimed")?,
            receiver_id: row.i64("receiver_id")?,
            receiver_name: row.label("receiver_name")?,
            food_id: row.i64("food_id")?,
            food_name: row.label("food_name")?,
            quantity_available: row.f64("quantity_available")?,
            provider_id: row.i64("provider_id")?,
            provider_name: row.label("provider_name")?,
        });
    }

    log::debug!("🧾 claims_feed: {} claims", claims.len());
    Ok(NormalizedResult::from_rows(claims))
}

/// Distinct values available to drive filters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub provider_cities: Vec<String>,
    pub provider_types: Vec<String>,
    pub receiver_cities: Vec<String>,
    pub receiver_types: Vec<String>,
    pub food_types: Vec<String>,
}

const FILTER_OPTIONS_SQL: &str = "
SELECT 'provider_city' AS facet, city AS value FROM providers
UNION SELECT 'provider_type', type FROM providers
UNION SELECT 'receiver_city', city FROM receivers
UNION SELECT 'receiver_type', type FROM receivers
UNION SELECT 'food_type', food_type FROM food_listings
ORDER BY facet, value";

pub fn filter_options<E: QueryExecutor + ?Sized>(store: &E) -> Result<FilterOptions, DataAccessError> {
    let rows = store.execute(&QueryDescriptor::new("filter_options", FILTER_OPTIONS_SQL))?;

    let mut options = FilterOptions::default();
    for row in rows {
        let Some(value) = row.opt_text("value")? else {
            continue;
        };
        let bucket = match row.text("facet")?.as_str() {
            "provider_city" => &mut options.provider_cities,
            "provider_type" => &mut options.provider_types,
            "receiver_city" => &mut options.receiver_cities,
            "receiver_type" => &mut options.receiver_types,
            "food_type" => &mut options.food_types,
            _ => continue,
        };
        bucket.push(value);
    }

    Ok(options)
}

/// Row counts of the four base relations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelationCounts {
    pub providers: u64,
    pub receivers: u64,
    pub food_listings: u64,
    pub claims: u64,
}

const RELATION_COUNTS_SQL: &str = "
SELECT (SELECT COUNT(*) FROM providers) AS providers,
       (SELECT COUNT(*) FROM receivers) AS receivers,
       (SELECT COUNT(*) FROM food_listings) AS food_listings,
       (SELECT COUNT(*) FROM claims) AS claims";

pub fn relation_counts<E: QueryExecutor + ?Sized>(store: &E) -> Result<RelationCounts, DataAccessError> {
    let rows = store.execute(&QueryDescriptor::new("relation_counts", RELATION_COUNTS_SQL))?;

    match rows.first() {
        Some(row) => Ok(RelationCounts {
            providers: row.count("providers")?,
            receivers: row.count("receivers")?,
            food_listings: row.count("food_listings")?,
            claims: row.count("claims")?,
        }),
        None => Ok(RelationCounts::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rankings::successful_providers;
    use crate::test_fixtures::FixtureDb;

    fn seed(db: &FixtureDb) {
        db.provider(1, "Green Grocer", "Grocery", "Lyon");
        db.provider(2, "Corner Bakery", "Bakery", "Paris");
        db.provider(3, "Empty Cafe", "Restaurant", "Lyon");
        db.receiver(1, "Hope Shelter", "Shelter", "Lyon");
        db.receiver(2, "City NGO", "NGO", "Paris");
        db.listing(10, 1, "Carrots", "Vegetables", 30.0, "Available", "2026-10-19");
        db.listing(11, 1, "Apples", "Fruits", 20.0, "Claimed", "2026-10-25");
        db.listing(20, 2, "Bread", "Bakery", 15.0, "Expired", "2026-10-10");
        db.listing(21, 2, "Croissants", "Bakery", 5.0, "Available", "2026-10-20");
        db.claim(1, 10, 1, "Completed", 10.0, "2026-10-01 09:30:00");
        db.claim(2, 10, 2, "Pending", 5.0, "2026-10-03 12:00:00");
        db.claim(3, 11, 1, "Completed", 20.0, "2026-10-05 08:15:00");
        db.claim(4, 21, 2, "Cancelled", 5.0, "2026-10-07 17:45:00");
    }

    #[test]
    fn test_provider_directory_totals() {
        let db = FixtureDb::new();
        seed(&db);

        let result = provider_directory(&db.store(), &ProviderFilter::default()).unwrap();
        let names: Vec<&str> = result.rows().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Green Grocer", "Corner Bakery", "Empty Cafe"]);

        let grocer = &result.rows()[0];
        assert_eq!(grocer.total_food_items, 2);
        // Claims on listing 10 must not multiply its 30 units
        assert_eq!(grocer.total_quantity, 50.0);
        assert_eq!(grocer.total_claims, 3);
        assert_eq!(grocer.successful_claims, 2);
        assert_eq!(grocer.success_rate_percentage, 66.7);

        let cafe = &result.rows()[2];
        assert_eq!(cafe.total_claims, 0);
        assert_eq!(cafe.success_rate_percentage, 0.0);
    }

    #[test]
    fn test_provider_rate_matches_ranking() {
        let db = FixtureDb::new();
        seed(&db);
        let store = db.store();

        let directory = provider_directory(&store, &ProviderFilter::default()).unwrap();
        let ranking = successful_providers(&store).unwrap();

        for ranked in ranking.rows() {
            let listed = directory
                .rows()
                .iter()
                .find(|p| p.provider_id == ranked.provider_id)
                .unwrap();
            assert_eq!(
                listed.success_rate_percentage.to_bits(),
                ranked.success_rate_percentage.to_bits()
            );
        }
    }

    #[test]
    fn test_provider_directory_filters() {
        let db = FixtureDb::new();
        seed(&db);
        let store = db.store();

        let lyon = provider_directory(
            &store,
            &ProviderFilter {
                city: Some("Lyon".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(lyon.len(), 2);

        let bakery = provider_directory(
            &store,
            &ProviderFilter {
                name_contains: Some("bake".to_string()),
                provider_type: Some("Bakery".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(bakery.len(), 1);
        assert_eq!(bakery.rows()[0].provider_id, 2);

        let wildcard = provider_directory(
            &store,
            &ProviderFilter {
                name_contains: Some("%".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(wildcard.is_empty());
    }

    #[test]
    fn test_food_inventory_order_and_filters() {
        let db = FixtureDb::new();
        seed(&db);
        let store = db.store();

        let all = food_inventory(&store, &ListingFilter::default()).unwrap();
        let ids: Vec<i64> = all.rows().iter().map(|l| l.food_id).collect();
        assert_eq!(ids, vec![20, 10, 21, 11]);
        assert_eq!(all.rows()[1].provider_name, "Green Grocer");

        let available_bakery = food_inventory(
            &store,
            &ListingFilter {
                food_type: Some("Bakery".to_string()),
                status: Some(ListingStatus::Available),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(available_bakery.len(), 1);
        assert_eq!(available_bakery.rows()[0].food_name, "Croissants");
    }

    #[test]
    fn test_inventory_overview() {
        let db = FixtureDb::new();
        seed(&db);
        let as_of = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();

        let result = inventory_overview(&db.store(), as_of, 2).unwrap();

        assert_eq!(
            result.rows(),
            &[InventoryOverview {
                total_items: 4,
                available_items: 2,
                expiring_soon: 2,
                expired_items: 1,
            }]
        );
    }

    #[test]
    fn test_inventory_overview_unbounded_horizon() {
        let db = FixtureDb::new();
        seed(&db);
        let as_of = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();

        let result = inventory_overview(&db.store(), as_of, u32::MAX).unwrap();

        // Every non-expired listing from the report date on
        assert_eq!(result.rows()[0].expiring_soon, 3);
    }

    #[test]
    fn test_inventory_overview_empty() {
        let db = FixtureDb::new();
        let as_of = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert!(inventory_overview(&db.store(), as_of, 2).unwrap().is_empty());
    }

    #[test]
    fn test_claims_feed() {
        let db = FixtureDb::new();
        seed(&db);
        let store = db.store();

        let all = claims_feed(&store, &ClaimFilter::default()).unwrap();
        let ids: Vec<i64> = all.rows().iter().map(|c| c.claim_id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
        assert_eq!(all.rows()[0].provider_name, "Corner Bakery");
        assert_eq!(all.rows()[0].quantity_available, 5.0);

        let window = claims_feed(
            &store,
            &ClaimFilter {
                from: NaiveDate::from_ymd_opt(2026, 10, 3),
                to: NaiveDate::from_ymd_opt(2026, 10, 5),
                ..Default::default()
            },
        )
        .unwrap();
        let ids: Vec<i64> = window.rows().iter().map(|c| c.claim_id).collect();
        assert_eq!(ids, vec![3, 2]);

        let hope_completed = claims_feed(
            &store,
            &ClaimFilter {
                status: Some(ClaimStatus::Completed),
                receiver_name_contains: Some("hope".to_string()),
                provider_name_contains: Some("grocer".to_string()),
                limit: Some(1),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(hope_completed.len(), 1);
        assert_eq!(hope_completed.rows()[0].claim_id, 3);
    }

    #[test]
    fn test_filter_options_and_counts() {
        let db = FixtureDb::new();
        seed(&db);
        let store = db.store();

        let options = filter_options(&store).unwrap();
        assert_eq!(options.provider_cities, vec!["Lyon", "Paris"]);
        assert_eq!(options.provider_types, vec!["Bakery", "Grocery", "Restaurant"]);
        assert_eq!(options.receiver_types, vec!["NGO", "Shelter"]);
        assert_eq!(options.food_types, vec!["Bakery", "Fruits", "Vegetables"]);

        assert_eq!(
            relation_counts(&store).unwrap(),
            RelationCounts {
                providers: 3,
                receivers: 2,
                food_listings: 4,
                claims: 4,
            }
        );
    }
}
