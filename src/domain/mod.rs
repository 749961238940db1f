//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `profile` - Customer profile and role
//! - `membership` - Plans, membership lifecycle, confirmation message
//! - `codes` - Access codes, discount codes, code generators
//! - `pricing` - Discount arithmetic and checkout summaries

pub mod codes;
pub mod foundation;
pub mod membership;
pub mod pricing;
pub mod profile;
