//! quip-core - Core library for Quip
//!
//! Quote records, the persisted local store, the remote gateway, the
//! server-wins reconciler and the sync orchestrator shared by every Quip
//! front end.

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod remote;
pub mod services;
pub mod state;
pub mod store;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{QuoteId, QuoteRecord};
pub use services::QuoteBook;
