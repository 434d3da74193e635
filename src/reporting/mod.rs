pub mod html;
pub mod screenshots;

pub use html::{render, write_report, REPORT_FILE};
pub use screenshots::{find_screenshot, screenshot_file_name};
