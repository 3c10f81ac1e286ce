pub mod source;
pub mod sources;

pub use source::{ResourceError, ResourceId, ResourceSource, SourceError};
pub use sources::HttpResourceSource;
