pub mod surface;
pub mod wait;
pub mod scan;
pub mod script;
pub mod chromium;

pub use surface::{EmbedSurface, EmbedTarget, RenderEvents, SurfaceFactory};
pub use wait::{await_page_render, synthesize_page_errors, WaitOutcome, WaitPolicy};
pub use scan::{scan_report, ReportScan};
pub use chromium::{ChromiumBrowser, ChromiumSurface};
