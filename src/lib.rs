pub mod live;
pub mod preferences;

pub use live::*;
pub use preferences::*;

/// Common result type for Vigil operations
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
