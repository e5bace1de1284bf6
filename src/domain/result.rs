//! Result type alias for Almoner
//!
//! This module provides a convenient Result type alias that uses ReconError
//! as the error type.

use super::errors::ReconError;

/// Result type alias for Almoner operations
///
/// # Examples
///
/// ```
/// use almoner::domain::result::Result;
/// use almoner::domain::errors::ReconError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ReconError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ReconError>;
