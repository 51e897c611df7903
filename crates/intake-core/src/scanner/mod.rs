pub mod log;
pub mod walk;

pub use log::{reason_counts, write_csv, write_csv_file, ExcludedItemLog};
pub use walk::TreeScanner;
