// Declare modules at the root level
pub mod domain;
pub mod error;
pub mod id_generator;
pub mod projection;
pub mod pump;
pub mod ranges;
pub mod session;
pub mod stats;
pub mod store;
pub mod telemetry;
pub mod time;
pub mod validators;
pub mod views;

// Test utilities module (available in test and integration test builds)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export everything under a shared namespace for external access
pub mod shared {
    pub use super::domain;
    pub use super::error;
    pub use super::id_generator;
    pub use super::projection;
    pub use super::pump;
    pub use super::ranges;
    pub use super::session;
    pub use super::stats;
    pub use super::store;
    pub use super::telemetry;
    pub use super::time;
    pub use super::validators;
    pub use super::views;
}

// Also re-export at root for convenience
pub use domain::*;
pub use error::*;
pub use id_generator::*;
pub use projection::*;
pub use pump::*;
pub use ranges::*;
pub use session::*;
pub use stats::*;
pub use store::*;
pub use telemetry::*;
pub use time::*;
pub use validators::*;
pub use views::*;
