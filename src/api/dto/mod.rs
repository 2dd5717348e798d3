//! Data Transfer Objects for API requests and responses.
//!
//! All DTOs use Serde for JSON serialization/deserialization and validator
//! for input validation. Domain entities that are already `Serialize` are
//! returned as-is.

pub mod audits;
pub mod corrections;
pub mod health;
pub mod links;
pub mod maintenance;
pub mod monitoring;
pub mod pagination;
