//! Codes module - member access codes, promotional discount codes, and the
//! random generators behind both.

mod access_code;
mod discount_code;
pub mod generator;

pub use access_code::{AccessCode, NewAccessCode};
pub use discount_code::{
    normalize_code, DiscountCode, DiscountCodeUpdate, DiscountRejection, PlanScope,
};
pub use generator::{
    access_code_remaining_days, calculate_access_code_expiration, format_access_code,
    generate_access_code, generate_access_code_batch, generate_coupon_batch,
    is_access_code_expired, is_valid_access_code_format, DEFAULT_ACCESS_CODE_LENGTH,
    DEFAULT_ACCESS_CODE_PREFIX, DEFAULT_ACCESS_CODE_VALIDITY_DAYS,
};
