//! Sale totals computation
//!
//! Pure derivation of line totals, subtotal, sale-level discount,
//! total, paid and change due, plus the resulting sale status. Every
//! rounding step is 2dp half-up, applied per currency component.
//!
//! Inputs come from the sale aggregate; this module never touches the
//! database, so every rule here is unit-testable in isolation.

use rust_decimal::Decimal;

use crate::money::{round_half_up, Amounts};
use crate::repos::sale_repo::SaleStatus;

/// One sale line as input to the totals computation.
#[derive(Debug, Clone, Copy)]
pub struct LineInput {
    pub quantity: i64,
    pub unit_price: Amounts,
    /// Absolute discount applied to the whole line.
    pub discount: Amounts,
}

/// One payment as input to the totals computation.
#[derive(Debug, Clone, Copy)]
pub struct PaymentInput {
    pub amount: Amounts,
    /// Change handed back to the customer; excluded from paid totals.
    pub is_change: bool,
}

/// Sale-level discount policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountPolicy {
    None,
    /// Percentage of the subtotal, 0..=100.
    Percent(Decimal),
    /// Absolute amount, expressed in the local currency only.
    Amount(Decimal),
}

/// Full result of a totals computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleTotals {
    pub line_totals: Vec<Amounts>,
    pub subtotal: Amounts,
    pub discount: Amounts,
    pub total: Amounts,
    pub total_paid: Amounts,
    pub change_due: Amounts,
    pub status: SaleStatus,
}

/// Compute the derived totals for a sale.
pub fn compute(
    lines: &[LineInput],
    payments: &[PaymentInput],
    discount: DiscountPolicy,
) -> SaleTotals {
    let mut subtotal = Amounts::ZERO;
    let mut line_totals = Vec::with_capacity(lines.len());

    for line in lines {
        let line_total = (line.unit_price.scale(line.quantity) - line.discount).rounded();
        subtotal += line_total;
        line_totals.push(line_total);
    }
    let subtotal = subtotal.rounded();

    let discount_amount = match discount {
        DiscountPolicy::None => Amounts::ZERO,
        DiscountPolicy::Percent(pct) => {
            let factor = pct / Decimal::ONE_HUNDRED;
            Amounts {
                local: round_half_up(subtotal.local * factor),
                usd: round_half_up(subtotal.usd * factor),
            }
        }
        DiscountPolicy::Amount(value) => Amounts {
            local: round_half_up(value),
            usd: Decimal::ZERO,
        },
    };

    let total = subtotal.saturating_sub(discount_amount).rounded();

    let mut total_paid = Amounts::ZERO;
    for payment in payments {
        if !payment.is_change {
            total_paid += payment.amount;
        }
    }
    let total_paid = total_paid.rounded();

    let change_due = total_paid.saturating_sub(total);

    let status = derive_status(total, total_paid);

    SaleTotals {
        line_totals,
        subtotal,
        discount: discount_amount,
        total,
        total_paid,
        change_due,
        status,
    }
}

/// Derive the payment status from total vs. paid.
///
/// Comparison happens in the effective currency: local when the local
/// total is non-zero, otherwise USD. A zero-total sale is paid by
/// definition.
fn derive_status(total: Amounts, paid: Amounts) -> SaleStatus {
    let (total_eff, paid_eff) = if !total.local.is_zero() {
        (total.local, paid.local)
    } else {
        (total.usd, paid.usd)
    };

    if total_eff.is_zero() || paid_eff >= total_eff {
        SaleStatus::Paid
    } else if paid_eff.is_zero() {
        SaleStatus::Open
    } else {
        SaleStatus::PartiallyPaid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(quantity: i64, local: Decimal, usd: Decimal) -> LineInput {
        LineInput {
            quantity,
            unit_price: Amounts::new(local, usd),
            discount: Amounts::ZERO,
        }
    }

    fn payment(local: Decimal, usd: Decimal) -> PaymentInput {
        PaymentInput {
            amount: Amounts::new(local, usd),
            is_change: false,
        }
    }

    #[test]
    fn test_two_units_of_five_in_stock() {
        // Selling 2 units priced 120,000 local / 10.00 USD each.
        let totals = compute(
            &[line(2, dec!(120000), dec!(10.00))],
            &[payment(dec!(240000), dec!(0))],
            DiscountPolicy::None,
        );
        assert_eq!(totals.subtotal.local, dec!(240000.00));
        assert_eq!(totals.subtotal.usd, dec!(20.00));
        assert_eq!(totals.total.local, dec!(240000.00));
        assert_eq!(totals.total_paid.local, dec!(240000.00));
        assert_eq!(totals.change_due, Amounts::ZERO);
        assert_eq!(totals.status, SaleStatus::Paid);
    }

    #[test]
    fn test_line_discount_reduces_line_total() {
        let totals = compute(
            &[LineInput {
                quantity: 3,
                unit_price: Amounts::new(dec!(1000), dec!(1.00)),
                discount: Amounts::new(dec!(500), dec!(0.50)),
            }],
            &[],
            DiscountPolicy::None,
        );
        assert_eq!(totals.line_totals[0].local, dec!(2500.00));
        assert_eq!(totals.line_totals[0].usd, dec!(2.50));
        assert_eq!(totals.subtotal, totals.line_totals[0]);
    }

    #[test]
    fn test_percent_discount_rounds_half_up_per_currency() {
        // 12.5% of 1001.00 is 125.125, rounds to 125.13.
        let totals = compute(
            &[line(1, dec!(1001.00), dec!(100.10))],
            &[],
            DiscountPolicy::Percent(dec!(12.5)),
        );
        assert_eq!(totals.discount.local, dec!(125.13));
        assert_eq!(totals.total.local, dec!(875.87));
        // 12.5% of 100.10 is 12.5125, rounds to 12.51.
        assert_eq!(totals.discount.usd, dec!(12.51));
        assert_eq!(totals.total.usd, dec!(87.59));
    }

    #[test]
    fn test_amount_discount_applies_to_local_only() {
        let totals = compute(
            &[line(1, dec!(5000), dec!(5.00))],
            &[],
            DiscountPolicy::Amount(dec!(1000)),
        );
        assert_eq!(totals.discount.local, dec!(1000.00));
        assert_eq!(totals.discount.usd, dec!(0));
        assert_eq!(totals.total.local, dec!(4000.00));
        assert_eq!(totals.total.usd, dec!(5.00));
    }

    #[test]
    fn test_discount_larger_than_subtotal_clamps_total_at_zero() {
        let totals = compute(
            &[line(1, dec!(100), dec!(0))],
            &[],
            DiscountPolicy::Amount(dec!(500)),
        );
        assert_eq!(totals.total, Amounts::ZERO);
        assert_eq!(totals.status, SaleStatus::Paid);
    }

    #[test]
    fn test_change_rows_excluded_from_paid() {
        let totals = compute(
            &[line(1, dec!(1000), dec!(0))],
            &[
                payment(dec!(1500), dec!(0)),
                PaymentInput {
                    amount: Amounts::new(dec!(500), dec!(0)),
                    is_change: true,
                },
            ],
            DiscountPolicy::None,
        );
        assert_eq!(totals.total_paid.local, dec!(1500.00));
        assert_eq!(totals.change_due.local, dec!(500.00));
        assert_eq!(totals.status, SaleStatus::Paid);
    }

    #[test]
    fn test_unpaid_sale_is_open() {
        let totals = compute(&[line(1, dec!(1000), dec!(0))], &[], DiscountPolicy::None);
        assert_eq!(totals.status, SaleStatus::Open);
    }

    #[test]
    fn test_partial_payment() {
        let totals = compute(
            &[line(1, dec!(1000), dec!(0))],
            &[payment(dec!(400), dec!(0))],
            DiscountPolicy::None,
        );
        assert_eq!(totals.status, SaleStatus::PartiallyPaid);
        assert_eq!(totals.change_due, Amounts::ZERO);
    }

    #[test]
    fn test_usd_only_sale_uses_usd_for_status() {
        let totals = compute(
            &[line(2, dec!(0), dec!(10.00))],
            &[payment(dec!(0), dec!(20.00))],
            DiscountPolicy::None,
        );
        assert_eq!(totals.total.usd, dec!(20.00));
        assert_eq!(totals.status, SaleStatus::Paid);
    }

    #[test]
    fn test_empty_sale_is_paid_with_zero_totals() {
        let totals = compute(&[], &[], DiscountPolicy::None);
        assert_eq!(totals.subtotal, Amounts::ZERO);
        assert_eq!(totals.total, Amounts::ZERO);
        assert_eq!(totals.status, SaleStatus::Paid);
    }

    #[test]
    fn test_overpayment_yields_change() {
        let totals = compute(
            &[line(1, dec!(999.99), dec!(0))],
            &[payment(dec!(1000.00), dec!(0))],
            DiscountPolicy::None,
        );
        assert_eq!(totals.change_due.local, dec!(0.01));
        assert_eq!(totals.status, SaleStatus::Paid);
    }
}
