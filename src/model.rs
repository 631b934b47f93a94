//! Entity status vocabularies and report names

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStatus {
    Pending,
    Approved,
    Completed,
    Cancelled,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "Pending",
            ClaimStatus::Approved => "Approved",
            ClaimStatus::Completed => "Completed",
            ClaimStatus::Cancelled => "Cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(ClaimStatus::Pending),
            "Approved" => Some(ClaimStatus::Approved),
            "Completed" => Some(ClaimStatus::Completed),
            "Cancelled" => Some(ClaimStatus::Cancelled),
            _ => None,
        }
    }

    /// Lifecycle order
    pub fn all() -> [ClaimStatus; 4] {
        [
            ClaimStatus::Pending,
            ClaimStatus::Approved,
            ClaimStatus::Completed,
            ClaimStatus::Cancelled,
        ]
    }

    /// A claim counts as a success only once it is completed
    pub fn is_success(&self) -> bool {
        matches!(self, ClaimStatus::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingStatus {
    Available,
    Reserved,
    Claimed,
    Expired,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Available => "Available",
            ListingStatus::Reserved => "Reserved",
            ListingStatus::Claimed => "Claimed",
            ListingStatus::Expired => "Expired",
        }
    }
}

/// Every report the engine can run by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    TopFoodClaimers,
    FoodTypeDistribution,
    SuccessfulProviders,
    ClaimStatusDistribution,
    GeographicDistribution,
    SystemMetrics,
    ProviderDirectory,
    FoodInventory,
    InventoryOverview,
    ClaimsFeed,
    FilterOptions,
    RelationCounts,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::TopFoodClaimers => "top_food_claimers",
            ReportKind::FoodTypeDistribution => "food_type_distribution",
            ReportKind::SuccessfulProviders => "successful_providers",
            ReportKind::ClaimStatusDistribution => "claim_status_distribution",
            ReportKind::GeographicDistribution => "geographic_distribution",
            ReportKind::SystemMetrics => "system_metrics",
            ReportKind::ProviderDirectory => "provider_directory",
            ReportKind::FoodInventory => "food_inventory",
            ReportKind::InventoryOverview => "inventory_overview",
            ReportKind::ClaimsFeed => "claims_feed",
            ReportKind::FilterOptions => "filter_options",
            ReportKind::RelationCounts => "relation_counts",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|kind| kind.as_str() == s)
    }

    pub fn all() -> [ReportKind; 12] {
        [
            ReportKind::TopFoodClaimers,
            ReportKind::FoodTypeDistribution,
            ReportKind::SuccessfulProviders,
            ReportKind::ClaimStatusDistribution,
            ReportKind::GeographicDistribution,
            ReportKind::SystemMetrics,
            ReportKind::ProviderDirectory,
            ReportKind::FoodInventory,
            ReportKind::InventoryOverview,
            ReportKind::ClaimsFeed,
            ReportKind::FilterOptions,
            ReportKind::RelationCounts,
        ]
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
