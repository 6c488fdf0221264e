use std::collections::HashMap;

use crate::domain::model::{CustomizationRecord, LongRow, OrderDetail, PivotEntry, PivotRow};

/// Joins an item's customizations as `"<group>: <value>"` pairs, in their
/// original order. No customizations → empty string.
pub fn render_options(customizations: &[CustomizationRecord]) -> String {
    customizations
        .iter()
        .map(|c| format!("{}: {}", c.group_label, c.selected_value))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One LongRow per item, order and item order preserved. Pure and total:
/// orders with zero items simply contribute zero rows.
pub fn flatten(orders: &[OrderDetail]) -> Vec<LongRow> {
    let mut rows = Vec::new();
    for order in orders {
        for item in &order.items {
            rows.push(LongRow {
                order_id: order.order_id.clone(),
                date: order.date,
                store: order.store_name.clone(),
                person: order.recipient_name.clone(),
                item: item.name.clone(),
                options: render_options(&item.customizations),
            });
        }
    }
    rows
}

/// Groups LongRows by order id (first-seen order preserved) into one row per
/// order carrying every (item, options) pair. Nothing is dropped or merged,
/// so the pivot can always be expanded back into the same LongRows.
pub fn pivot(rows: &[LongRow]) -> Vec<PivotRow> {
    let mut order_ids: Vec<&str> = Vec::new();
    let mut grouped: HashMap<&str, PivotRow> = HashMap::new();

    for row in rows {
        let entry = grouped.entry(&row.order_id).or_insert_with(|| {
            order_ids.push(&row.order_id);
            PivotRow {
                order_id: row.order_id.clone(),
                date: row.date,
                store: row.store.clone(),
                person: row.person.clone(),
                items: Vec::new(),
            }
        });
        entry.items.push(PivotEntry {
            item: row.item.clone(),
            options: row.options.clone(),
        });
    }

    order_ids
        .into_iter()
        .filter_map(|id| grouped.remove(id))
        .collect()
}
