pub mod csv_table;
pub mod discovery;
pub mod error;
pub mod loader;

pub use csv_table::{CsvTable, normalize_header, read_csv_table};
pub use discovery::{Discovery, discover_datasets, list_csv_files};
pub use error::{IngestError, Result};
pub use loader::{LoadedTable, TableLoader};
