//! Shared services used across clients

mod quote_book;

pub use quote_book::{QuoteBook, FILTER_KEY};
