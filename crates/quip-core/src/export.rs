//! Quote snapshot export and import shared by every client.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{validate_quote_fields, QuoteRecord};

/// Shape accepted by [`parse_import`]; anything besides text and category is
/// ignored so both exports and hand-written files load.
#[derive(Debug, Deserialize)]
struct ImportItem {
    text: String,
    category: String,
}

/// Render records as a pretty-printed JSON array.
pub fn render_json_export(records: &[QuoteRecord]) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(records).map_err(|error| Error::Parse(error.to_string()))
}

/// Parse an exported (or hand-written) JSON array into fresh local records.
///
/// All-or-nothing: any malformed entry or empty field rejects the whole
/// payload with [`Error::Parse`]. Imported records get new ids so importing
/// the same file twice yields two copies.
pub fn parse_import(bytes: &[u8]) -> Result<Vec<QuoteRecord>> {
    let items: Vec<ImportItem> = serde_json::from_slice(bytes)
        .map_err(|error| Error::Parse(format!("invalid quote file: {error}")))?;

    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| {
            let (text, category) = validate_quote_fields(&item.text, &item.category)
                .map_err(|error| Error::Parse(format!("entry {}: {error}", position + 1)))?;
            Ok(QuoteRecord::new(text, category))
        })
        .collect()
}
