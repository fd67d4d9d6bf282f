//! Data models for Quip

mod conflict;
mod quote;

pub use conflict::Conflict;
pub use quote::{default_quotes, validate_quote_fields, Origin, QuoteId, QuoteRecord};

/// An ordered collection of quote records for one side of a sync
pub type Snapshot = Vec<QuoteRecord>;
