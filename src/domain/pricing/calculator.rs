//! Integer-cents price arithmetic and checkout summaries.
//!
//! Percentages are whole numbers in `0..=100`; values outside that range are
//! clamped. Savings round half-up, and the discounted price is always
//! `original - savings` so the two add back to the original price.

use serde::{Deserialize, Serialize};

use crate::domain::membership::PlanId;

use super::DiscountTier;

fn clamp_percentage(percentage: i32) -> i64 {
    i64::from(percentage.clamp(0, 100))
}

/// Amount saved by applying `percentage` to `original_cents`, rounded half-up.
pub fn calculate_savings(original_cents: i64, percentage: i32) -> i64 {
    let scaled = original_cents * clamp_percentage(percentage);
    (scaled + 50).div_euclid(100)
}

/// Price after applying `percentage` off `original_cents`.
pub fn calculate_discounted_price(original_cents: i64, percentage: i32) -> i64 {
    original_cents - calculate_savings(original_cents, percentage)
}

/// Renders cents as dollars: `14999` -> `"$149.99"`.
pub fn format_price(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}

/// Price breakdown shown on the checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSummary {
    pub plan_id: PlanId,
    pub plan_name: String,
    pub original_price: i64,
    pub discount_percentage: i32,
    pub discount_amount: i64,
    pub final_price: i64,
    /// Echo of the applied code. `None` when no code applied.
    pub discount_code: Option<String>,
}

/// Builds the checkout summary for a plan and optional coupon code.
///
/// Returns `None` for an unknown plan. A code whose prefix matches no tier,
/// or whose tier does not cover the plan, is ignored.
pub fn calculate_checkout_summary(
    plan_id: &str,
    discount_code: Option<&str>,
) -> Option<CheckoutSummary> {
    let plan = PlanId::lookup(plan_id)?;

    let applied = discount_code
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .and_then(|code| {
            DiscountTier::from_code(code)
                .filter(|tier| tier.applies_to(plan))
                .map(|tier| (code.to_uppercase(), tier.percentage()))
        });

    Some(match applied {
        Some((code, percentage)) => summary_with_percentage(plan, percentage, Some(code)),
        None => summary_with_percentage(plan, 0, None),
    })
}

/// Summary for an already-validated percentage, e.g. from a stored discount code.
pub fn summary_with_percentage(
    plan: PlanId,
    percentage: i32,
    discount_code: Option<String>,
) -> CheckoutSummary {
    let original_price = plan.monthly_price_cents();
    let percentage = percentage.clamp(0, 100);
    let discount_amount = calculate_savings(original_price, percentage);

    CheckoutSummary {
        plan_id: plan,
        plan_name: plan.display_name().to_string(),
        original_price,
        discount_percentage: percentage,
        discount_amount,
        final_price: original_price - discount_amount,
        discount_code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn twenty_percent_off_ten_thousand() {
        assert_eq!(calculate_discounted_price(10_000, 20), 8_000);
        assert_eq!(calculate_savings(10_000, 20), 2_000);
    }

    #[test]
    fn savings_round_half_up() {
        // 24999 * 0.25 = 6249.75
        assert_eq!(calculate_savings(24_999, 25), 6_250);
        // 14999 * 0.10 = 1499.9
        assert_eq!(calculate_savings(14_999, 10), 1_500);
        // 1 * 0.50 = 0.5
        assert_eq!(calculate_savings(1, 50), 1);
    }

    #[test]
    fn out_of_range_percentages_are_clamped() {
        assert_eq!(calculate_savings(10_000, 150), 10_000);
        assert_eq!(calculate_savings(10_000, -5), 0);
    }

    #[test]
    fn format_price_renders_dollars() {
        assert_eq!(format_price(14_999), "$149.99");
        assert_eq!(format_price(5), "$0.05");
        assert_eq!(format_price(0), "$0.00");
        assert_eq!(format_price(-150), "-$1.50");
    }

    #[test]
    fn summary_without_code_is_full_price() {
        let summary = calculate_checkout_summary("maintenance-basic", None).unwrap();
        assert_eq!(summary.original_price, 14_999);
        assert_eq!(summary.discount_percentage, 0);
        assert_eq!(summary.discount_amount, 0);
        assert_eq!(summary.final_price, 14_999);
        assert_eq!(summary.discount_code, None);
    }

    #[test]
    fn premium_code_takes_twenty_percent_and_echoes_code() {
        let summary =
            calculate_checkout_summary("maintenance-premium", Some("PREMIUMXXXX")).unwrap();
        let expected_discount = (24_999_f64 * 0.20).round() as i64;
        assert_eq!(summary.discount_percentage, 20);
        assert_eq!(summary.final_price, 24_999 - expected_discount);
        assert_eq!(summary.discount_code.as_deref(), Some("PREMIUMXXXX"));
    }

    #[test]
    fn mismatched_tier_code_is_ignored() {
        let summary = calculate_checkout_summary("maintenance-basic", Some("ELITE1234")).unwrap();
        assert_eq!(summary.final_price, 14_999);
        assert_eq!(summary.discount_code, None);
    }

    #[test]
    fn referral_code_applies_to_elite() {
        let summary =
            calculate_checkout_summary("maintenance-elite", Some("referral12ab")).unwrap();
        assert_eq!(summary.discount_percentage, 15);
        assert_eq!(summary.discount_amount, 6_000);
        assert_eq!(summary.discount_code.as_deref(), Some("REFERRAL12AB"));
    }

    #[test]
    fn unknown_plan_has_no_summary() {
        assert!(calculate_checkout_summary("maintenance-gold", None).is_none());
    }

    proptest! {
        #[test]
        fn savings_and_discounted_price_sum_to_original(
            original in 0i64..10_000_000,
            percentage in 0i32..=100,
        ) {
            prop_assert_eq!(
                calculate_savings(original, percentage)
                    + calculate_discounted_price(original, percentage),
                original
            );
        }

        #[test]
        fn discounted_price_never_exceeds_original(
            original in 0i64..10_000_000,
            percentage in 0i32..=100,
        ) {
            let discounted = calculate_discounted_price(original, percentage);
            prop_assert!(discounted <= original);
            prop_assert!(discounted >= 0);
        }
    }
}
