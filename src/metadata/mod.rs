pub mod fetch;
pub mod loader;

pub use fetch::{fetch_workspace_metadata, write_metadata, METADATA_FILE_NAME};
pub use loader::{filter_reports, load_reports, validate_reports, ReportIssue};
