//! Dual-currency monetary amounts
//!
//! Every monetary value in the ledger is carried in two currencies at
//! once: the local currency and USD. `Amounts` bundles the pair so
//! arithmetic stays in lockstep, and all persisted values are rounded
//! to 2 decimal places with half-up rounding.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub};

/// Round a monetary value to 2 decimal places, half-up.
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// A monetary value carried in both the local currency and USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Amounts {
    pub local: Decimal,
    pub usd: Decimal,
}

impl Amounts {
    pub const ZERO: Amounts = Amounts {
        local: Decimal::ZERO,
        usd: Decimal::ZERO,
    };

    pub fn new(local: Decimal, usd: Decimal) -> Self {
        Amounts { local, usd }
    }

    /// Both components rounded to 2dp half-up.
    pub fn rounded(self) -> Self {
        Amounts {
            local: round_half_up(self.local),
            usd: round_half_up(self.usd),
        }
    }

    /// Scale both components by an integer quantity.
    pub fn scale(self, quantity: i64) -> Self {
        let q = Decimal::from(quantity);
        Amounts {
            local: self.local * q,
            usd: self.usd * q,
        }
    }

    /// Component-wise subtraction clamped at zero.
    pub fn saturating_sub(self, other: Amounts) -> Self {
        Amounts {
            local: (self.local - other.local).max(Decimal::ZERO),
            usd: (self.usd - other.usd).max(Decimal::ZERO),
        }
    }

    pub fn is_zero(self) -> bool {
        self.local.is_zero() && self.usd.is_zero()
    }
}

impl Add for Amounts {
    type Output = Amounts;

    fn add(self, other: Amounts) -> Amounts {
        Amounts {
            local: self.local + other.local,
            usd: self.usd + other.usd,
        }
    }
}

impl AddAssign for Amounts {
    fn add_assign(&mut self, other: Amounts) {
        self.local += other.local;
        self.usd += other.usd;
    }
}

impl Sub for Amounts {
    type Output = Amounts;

    fn sub(self, other: Amounts) -> Amounts {
        Amounts {
            local: self.local - other.local,
            usd: self.usd - other.usd,
        }
    }
}
