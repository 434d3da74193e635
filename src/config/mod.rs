pub mod parser;
pub mod types;
pub mod credentials;
pub mod endpoints;
pub mod settings;

pub use types::*;
pub use parser::parse_config;
pub use endpoints::ApiEndpoints;
pub use settings::{Settings, SettingsOverrides, ServicePrincipal, ProbeSettings, BrowserSettings};
