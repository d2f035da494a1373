//! Storage for cleaned tables and analysis results.
//!
//! [`CleanedStore`] is the contract between cleaning and aggregation: whole
//! tables are put and fetched by dataset, and an absent table reads as an
//! empty frame. [`MemoryStore`] backs dry runs and tests; [`CsvStore`]
//! persists one CSV per dataset plus a SHA-256 manifest.

pub mod codec;
pub mod csv_store;
pub mod error;
pub mod hash;
pub mod manifest;
pub mod memory;
pub mod results;
pub mod store;

pub use codec::write_atomic;
pub use csv_store::CsvStore;
pub use error::{Result, StoreError};
pub use hash::sha256_hex;
pub use manifest::{MANIFEST_FILE, Manifest, ManifestEntry};
pub use memory::MemoryStore;
pub use results::ResultWriter;
pub use store::{CleanedStore, select_keys};
