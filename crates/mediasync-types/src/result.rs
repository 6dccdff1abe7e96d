//! Result type alias for mediasync operations

use crate::Error;

/// Result type alias for mediasync operations
pub type Result<T> = std::result::Result<T, Error>;
