//! Translation Service Shared Library
//!
//! Wire types and input validation shared between the backend and its clients.

pub mod types;
pub mod validation;

// Re-export commonly used items
pub use types::*;
pub use validation::*;
