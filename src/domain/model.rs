use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Substituted when an order has no recognizable recipient.
pub const UNKNOWN_PERSON: &str = "Unknown";
/// Substituted when the store record or its name is missing.
pub const UNKNOWN_STORE: &str = "Unknown Store";
/// Substituted when an item arrives without a name.
pub const UNKNOWN_ITEM: &str = "Unknown Item";

/// Sentinel used when an order carries no parsable timestamp.
pub fn fallback_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).expect("1900-01-01 is a valid date")
}

/// Minimal per-order record produced by the paginated listing.
/// Ephemeral: only seeds the detail fetch work list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub order_id: String,
    pub fetched_at_offset: usize,
}

/// One selected option within a named customization group,
/// e.g. group "Step 1" with value "Super Greens".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomizationRecord {
    pub group_label: String,
    pub selected_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub name: String,
    pub customizations: Vec<CustomizationRecord>,
}

/// Full per-order record. Immutable once parsed; missing optional fields have
/// already been replaced with the placeholders above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order_id: String,
    pub date: NaiveDate,
    pub store_name: String,
    pub recipient_name: String,
    pub items: Vec<ItemRecord>,
}

/// One export row per ordered item. `order_id` is kept for grouping but is
/// not written to the long export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongRow {
    pub order_id: String,
    pub date: NaiveDate,
    pub store: String,
    pub person: String,
    pub item: String,
    pub options: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotEntry {
    pub item: String,
    pub options: String,
}

/// One export row per order; the writer fans `items` out into
/// `Item N` / `Options N` column pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotRow {
    pub order_id: String,
    pub date: NaiveDate,
    pub store: String,
    pub person: String,
    pub items: Vec<PivotEntry>,
}

/// Result of the extract stage: orders in summary order, plus the ids that
/// could not be fetched or parsed.
#[derive(Debug, Default)]
pub struct Extraction {
    pub orders: Vec<OrderDetail>,
    pub failed_order_ids: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub long_rows: Vec<LongRow>,
    pub pivot_rows: Vec<PivotRow>,
}

/// Result of the load stage. A single failed export does not fail the run;
/// both failing does.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub written: Vec<String>,
    pub failed: Vec<(String, String)>,
}
