//! ValidateAndGetDiscountHandler - server-side discount code check.
//!
//! Rule failures come back as a structured `DiscountValidation`; only
//! storage failures are errors.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::codes::{normalize_code, DiscountCode, DiscountRejection};
use crate::domain::foundation::Timestamp;
use crate::domain::membership::{MembershipError, PlanId};
use crate::ports::{DataStore, DiscountCodeStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscountValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<DiscountCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DiscountValidation {
    fn accepted(discount: DiscountCode) -> Self {
        Self {
            valid: true,
            discount: Some(discount),
            error: None,
        }
    }

    fn rejected(reason: DiscountRejection) -> Self {
        Self {
            valid: false,
            discount: None,
            error: Some(reason.message().to_string()),
        }
    }

    /// The redeemable code, or the rejection as a `MembershipError`.
    pub fn into_result(self, code: &str) -> Result<DiscountCode, MembershipError> {
        match self.discount {
            Some(discount) if self.valid => Ok(discount),
            _ => Err(MembershipError::invalid_discount_code(
                code,
                self.error
                    .unwrap_or_else(|| DiscountRejection::NotFound.message().to_string()),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidateDiscountQuery {
    pub code: String,
    pub plan_id: PlanId,
}

pub struct ValidateAndGetDiscountHandler {
    store: Arc<dyn DataStore>,
}

impl ValidateAndGetDiscountHandler {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        query: ValidateDiscountQuery,
    ) -> Result<DiscountValidation, MembershipError> {
        let code = normalize_code(&query.code);
        if code.is_empty() {
            return Ok(DiscountValidation::rejected(DiscountRejection::NotFound));
        }

        let Some(discount) = self.store.get_discount_code(&code).await? else {
            tracing::debug!(code = %code, "Discount code not found");
            return Ok(DiscountValidation::rejected(DiscountRejection::NotFound));
        };

        match discount.check_redeemable(query.plan_id, &Timestamp::now()) {
            Ok(()) => Ok(DiscountValidation::accepted(discount)),
            Err(reason) => {
                tracing::debug!(code = %code, plan_id = %query.plan_id, %reason, "Discount code rejected");
                Ok(DiscountValidation::rejected(reason))
            }
        }
    }
}
