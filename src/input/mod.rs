//! Work-item input loading
//!
//! Reads the tabular (CSV) input file and produces the ordered list of
//! [`WorkItem`]s for a run. The id and link columns are located by
//! case-insensitive header matching against a known synonym set, rows
//! missing either value are skipped, and a file yielding zero valid items
//! is a fatal error.

use crate::model::WorkItem;
use crate::InputError;
use std::path::Path;

/// Accepted header names for the id column
const ID_HEADERS: &[&str] = &["id", "product_id", "productid", "sku"];

/// Accepted header names for the target URL column
const LINK_HEADERS: &[&str] = &["link", "url", "product_link", "pdp_url"];

/// Loads work items from a CSV file
///
/// # Arguments
///
/// * `path` - Path to the input CSV file
///
/// # Returns
///
/// * `Ok(Vec<WorkItem>)` - Items in input order, at least one
/// * `Err(InputError)` - Unreadable file, missing columns, or no valid rows
pub fn load_work_items(path: &Path) -> Result<Vec<WorkItem>, InputError> {
    let file = std::fs::File::open(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let (id_col, link_col) = locate_columns(&headers).ok_or(InputError::MissingColumns)?;

    let mut items = Vec::new();
    for record in reader.records() {
        let record = record?;

        // Short rows cannot hold both fields
        let id = record.get(id_col).map(str::trim).unwrap_or("");
        let link = record.get(link_col).map(str::trim).unwrap_or("");
        if id.is_empty() || link.is_empty() {
            tracing::debug!("Skipping row with missing id or link");
            continue;
        }

        items.push(WorkItem {
            id: id.to_string(),
            target: link.to_string(),
        });
    }

    if items.is_empty() {
        return Err(InputError::NoValidItems);
    }

    Ok(items)
}

/// Locates the id and link columns in the header row
///
/// Matching is case-insensitive and ignores surrounding whitespace. When a
/// synonym appears more than once the first occurrence wins.
fn locate_columns(headers: &csv::StringRecord) -> Option<(usize, usize)> {
    let mut id_col = None;
    let mut link_col = None;

    for (index, header) in headers.iter().enumerate() {
        let normalized = header.trim().to_lowercase();
        if id_col.is_none() && ID_HEADERS.contains(&normalized.as_str()) {
            id_col = Some(index);
        } else if link_col.is_none() && LINK_HEADERS.contains(&normalized.as_str()) {
            link_col = Some(index);
        }
    }

    Some((id_col?, link_col?))
}
