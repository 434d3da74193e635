pub mod token;
pub mod embed;

pub use token::get_access_token;
pub use embed::{EmbedTokenIssuer, ReportEmbedInfo, TokenClient};
