pub mod ordered;
pub mod metadata;
pub mod result;
pub mod summary;

pub use ordered::OrderedMap;
pub use metadata::*;
pub use result::*;
pub use summary::*;
