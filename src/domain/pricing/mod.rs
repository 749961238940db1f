//! Pricing - pure discount arithmetic over the fixed plan price table.

mod calculator;
mod tier;

pub use calculator::{
    calculate_checkout_summary, calculate_discounted_price, calculate_savings, format_price,
    summary_with_percentage, CheckoutSummary,
};
pub use tier::DiscountTier;
