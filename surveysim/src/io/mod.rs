//! File formats: table files, the tile catalog and JSON input loaders.

pub mod catalog;
pub mod checksum;
pub mod loaders;
pub mod table_file;

pub use catalog::TileCatalogTable;
pub use checksum::calculate_checksum;
pub use loaders::{CatalogLoader, NightStatsLoader, ObservationLogLoader};
pub use table_file::{read_table, write_table, TABLE_FILE_VERSION};
