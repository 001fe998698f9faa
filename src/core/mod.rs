/*!
 * Core Module
 * Fundamental types, configuration, error handling, and the serialization guard
 */

pub mod config;
pub mod errors;
pub mod serial;
pub mod types;

// Re-export for convenience
pub use config::{DeliveryMode, LockOwnerPolicy, ShmemConfig, SpinConfig, ThreadLevel};
pub use errors::{fatal, require, ShmemError};
pub use serial::SerialGuard;
pub use types::*;
