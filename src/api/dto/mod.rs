//! Data Transfer Objects for REST request/response serialization.
//!
//! Amounts are integers in minor currency units. Identifiers are UUID
//! strings.

pub mod common_dto;
pub mod file_dto;
pub mod investment_dto;

pub use common_dto::*;
pub use file_dto::*;
pub use investment_dto::*;
