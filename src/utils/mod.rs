pub mod output;
pub mod formatting;
pub mod fs;
