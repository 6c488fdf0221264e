use crate::domain::model::{LongRow, PivotRow};
use crate::utils::error::{Result, ScrapeError};

pub const LONG_EXPORT_FILE: &str = "orders.csv";
pub const PIVOT_EXPORT_FILE: &str = "orders-pivot.csv";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Renders the long export: one row per ordered item, fixed header.
/// The csv writer handles quoting, so embedded delimiters, quotes and
/// newlines in field values round-trip through a standards-compliant reader.
pub fn render_long(rows: &[LongRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Date", "Store", "Person", "Item", "Options"])?;
    for row in rows {
        writer.write_record([
            row.date.format(DATE_FORMAT).to_string().as_str(),
            &row.store,
            &row.person,
            &row.item,
            &row.options,
        ])?;
    }
    finish(writer)
}

/// Renders the pivot export: one row per order, with `Item N` / `Options N`
/// column pairs sized to the widest order. Narrower orders pad with empty
/// cells so column alignment holds for every row.
pub fn render_pivot(rows: &[PivotRow]) -> Result<Vec<u8>> {
    let width = rows.iter().map(|r| r.items.len()).max().unwrap_or(0);

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec![
        "Date".to_string(),
        "Store".to_string(),
        "Person".to_string(),
    ];
    for n in 1..=width {
        header.push(format!("Item {}", n));
        header.push(format!("Options {}", n));
    }
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![
            row.date.format(DATE_FORMAT).to_string(),
            row.store.clone(),
            row.person.clone(),
        ];
        for slot in 0..width {
            match row.items.get(slot) {
                Some(entry) => {
                    record.push(entry.item.clone());
                    record.push(entry.options.clone());
                }
                None => {
                    record.push(String::new());
                    record.push(String::new());
                }
            }
        }
        writer.write_record(&record)?;
    }
    finish(writer)
}

fn finish(mut writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| ScrapeError::ProcessingError {
            message: format!("could not finalize CSV buffer: {}", e),
        })
}
