//! Delivery of discovery reports to the elchi collection endpoint.

pub mod client;
pub mod error;
pub mod token;

pub use client::DeliveryClient;
pub use client::DeliveryConfig;
pub use client::DeliveryOutcome;
pub use error::DeliveryError;
pub use error::DeliveryResult;
pub use token::extract_project;
