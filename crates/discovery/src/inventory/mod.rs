//! Cluster inventory: node classification and report assembly.

pub mod classifier;
pub mod collector;

pub use classifier::classify;
pub use classifier::Classification;
pub use collector::Collector;
pub use collector::UNKNOWN_VERSION;
