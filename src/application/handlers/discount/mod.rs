//! Discount code handlers.

mod validate_and_get_discount;

pub use validate_and_get_discount::{
    DiscountValidation, ValidateAndGetDiscountHandler, ValidateDiscountQuery,
};
