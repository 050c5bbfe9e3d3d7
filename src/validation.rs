//! Validation for write payloads
//!
//! Structural checks only; anything needing database state (stock
//! levels, remaining returnable quantity) is enforced inside the
//! service transactions.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::contracts::sale_return_v1::SaleReturnRequestV1;
use crate::contracts::sale_submit_v1::SaleSubmitRequestV1;
use crate::repos::sale_repo::DiscountType;

/// Validation errors for write payloads
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Sale must have at least one item")]
    EmptyItems,

    #[error("Item {index}: quantity must be positive, got {quantity}")]
    NonPositiveQuantity { index: usize, quantity: i64 },

    #[error("Item {index}: {field} must be non-negative")]
    NegativeAmount { index: usize, field: &'static str },

    #[error("Payment {index}: amount must be non-negative")]
    NegativePayment { index: usize },

    #[error("Percent discount must be between 0 and 100, got {0}")]
    InvalidDiscountPercent(Decimal),

    #[error("Amount discount must be non-negative, got {0}")]
    NegativeDiscountValue(Decimal),

    #[error("Return must have at least one item")]
    EmptyReturnItems,

    #[error("Return item {index}: quantity must be positive, got {quantity}")]
    NonPositiveReturnQuantity { index: usize, quantity: i64 },

    #[error("Return item {index}: refund amount must be non-negative")]
    NegativeRefund { index: usize },
}

/// Validate a sale submission payload.
pub fn validate_sale_submit(payload: &SaleSubmitRequestV1) -> Result<(), ValidationError> {
    if payload.items.is_empty() {
        return Err(ValidationError::EmptyItems);
    }

    for (index, item) in payload.items.iter().enumerate() {
        if item.quantity <= 0 {
            return Err(ValidationError::NonPositiveQuantity {
                index,
                quantity: item.quantity,
            });
        }
        if item.unit_price_local < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount {
                index,
                field: "unit_price_local",
            });
        }
        if item.unit_price_usd < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount {
                index,
                field: "unit_price_usd",
            });
        }
        if item.discount_local.unwrap_or(Decimal::ZERO) < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount {
                index,
                field: "discount_local",
            });
        }
        if item.discount_usd.unwrap_or(Decimal::ZERO) < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount {
                index,
                field: "discount_usd",
            });
        }
    }

    for (index, payment) in payload.payments.iter().enumerate() {
        if payment.amount_local < Decimal::ZERO || payment.amount_usd < Decimal::ZERO {
            return Err(ValidationError::NegativePayment { index });
        }
    }

    let discount_value = payload.discount_value.unwrap_or(Decimal::ZERO);
    match payload.discount_type {
        DiscountType::Percent => {
            if discount_value < Decimal::ZERO || discount_value > Decimal::ONE_HUNDRED {
                return Err(ValidationError::InvalidDiscountPercent(discount_value));
            }
        }
        DiscountType::Amount => {
            if discount_value < Decimal::ZERO {
                return Err(ValidationError::NegativeDiscountValue(discount_value));
            }
        }
        DiscountType::None => {}
    }

    Ok(())
}

/// Validate a sale return payload.
pub fn validate_sale_return(payload: &SaleReturnRequestV1) -> Result<(), ValidationError> {
    if payload.items.is_empty() {
        return Err(ValidationError::EmptyReturnItems);
    }

    for (index, item) in payload.items.iter().enumerate() {
        if item.quantity <= 0 {
            return Err(ValidationError::NonPositiveReturnQuantity {
                index,
                quantity: item.quantity,
            });
        }
        if item.refund_amount_local.unwrap_or(Decimal::ZERO) < Decimal::ZERO
            || item.refund_amount_usd.unwrap_or(Decimal::ZERO) < Decimal::ZERO
        {
            return Err(ValidationError::NegativeRefund { index });
        }
    }

    Ok(())
}
