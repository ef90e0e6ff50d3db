//! Application module
//!
//! This module contains the discovery loop and its process lifecycle,
//! organized into logical sub-modules.

pub mod builder;
pub mod core;
pub mod signals;

// Re-export main types
pub use builder::ApplicationBuilder;
pub use self::core::Application;
pub use self::core::CycleOutcome;
