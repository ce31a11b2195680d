//! Checkout Pricing Rules
//!
//! Tax, delivery fees and the discount policy that turn a cart subtotal into
//! the amount charged at checkout. Amounts are whole currency units (DZD).

use clap::ValueEnum;
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr};
use thiserror::Error;

/// Monetary amount in whole currency units
pub type Amount = u64;

/// VAT applied at checkout (19%)
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(19, 0, 0, false, 2);

// =============================================================================
// Delivery
// =============================================================================

/// A named shipping option with a flat fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    Standard,
    Express,
    Pickup,
}

impl DeliveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Express => "express",
            Self::Pickup => "pickup",
        }
    }
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryMethod {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "express" => Ok(Self::Express),
            "pickup" => Ok(Self::Pickup),
            other => Err(PricingError::UnknownDeliveryMethod(other.to_owned())),
        }
    }
}

/// Flat fee per delivery method. Fees never depend on cart contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRates {
    pub standard: Amount,
    pub express: Amount,
    pub pickup: Amount,
}

impl Default for DeliveryRates {
    fn default() -> Self {
        Self {
            standard: 500,
            express: 1200,
            pickup: 0,
        }
    }
}

impl DeliveryRates {
    /// Looks up the fee for `method`
    pub fn price(&self, method: DeliveryMethod) -> Amount {
        match method {
            DeliveryMethod::Standard => self.standard,
            DeliveryMethod::Express => self.express,
            DeliveryMethod::Pickup => self.pickup,
        }
    }
}

// =============================================================================
// Policy
// =============================================================================

/// Whether the cart discount is subtracted from the checkout total.
///
/// The cart summary always reports the discount; checkout historically did
/// not subtract it, so `Ignore` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DiscountPolicy {
    #[default]
    Ignore,
    Apply,
}

/// Errors raised while building a pricing policy or parsing its inputs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("tax rate must be between 0 and 1, got {0}")]
    InvalidTaxRate(Decimal),

    #[error("unknown delivery method: {0}")]
    UnknownDeliveryMethod(String),

    #[error("coupon must look like CODE=AMOUNT, got {0:?}")]
    InvalidCoupon(String),

    #[error("unknown coupon code: {0}")]
    UnknownCoupon(String),
}

// =============================================================================
// Coupons
// =============================================================================

/// A fixed-amount discount redeemable by code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub amount: Amount,
}

/// Codes are matched case-insensitively
fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl FromStr for Coupon {
    type Err = PricingError;

    /// Parses `CODE=AMOUNT`, e.g. `BIENVENUE=1000`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PricingError::InvalidCoupon(s.to_owned());

        let (code, amount) = s.split_once('=').ok_or_else(invalid)?;
        let code = normalize_code(code);
        if code.is_empty() {
            return Err(invalid());
        }
        let amount = amount.trim().parse().map_err(|_| invalid())?;

        Ok(Self { code, amount })
    }
}

/// The coupons the store accepts. Customers only ever name a code; the
/// amount always comes from here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CouponBook {
    amounts: HashMap<String, Amount>,
}

impl CouponBook {
    pub fn new(coupons: impl IntoIterator<Item = Coupon>) -> Self {
        Self {
            amounts: coupons
                .into_iter()
                .map(|c| (normalize_code(&c.code), c.amount))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    /// Resolves a customer-supplied code
    pub fn redeem(&self, code: &str) -> Result<Coupon, PricingError> {
        let code = normalize_code(code);

        match self.amounts.get(&code) {
            Some(&amount) => Ok(Coupon { code, amount }),
            None => Err(PricingError::UnknownCoupon(code)),
        }
    }
}

/// Tax rate, delivery table, discount policy and coupons used to price a cart
#[derive(Debug, Clone, PartialEq)]
pub struct PricingPolicy {
    tax_rate: Decimal,
    delivery: DeliveryRates,
    discount: DiscountPolicy,
    coupons: CouponBook,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: DEFAULT_TAX_RATE,
            delivery: DeliveryRates::default(),
            discount: DiscountPolicy::default(),
            coupons: CouponBook::default(),
        }
    }
}

impl PricingPolicy {
    /// Builds a policy, rejecting tax rates outside `0..=1`.
    pub fn new(
        tax_rate: Decimal,
        delivery: DeliveryRates,
        discount: DiscountPolicy,
    ) -> Result<Self, PricingError> {
        if tax_rate.is_sign_negative() || tax_rate > Decimal::ONE {
            return Err(PricingError::InvalidTaxRate(tax_rate));
        }

        Ok(Self {
            tax_rate,
            delivery,
            discount,
            coupons: CouponBook::default(),
        })
    }

    pub fn with_coupons(mut self, coupons: CouponBook) -> Self {
        self.coupons = coupons;
        self
    }

    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    pub fn delivery_rates(&self) -> &DeliveryRates {
        &self.delivery
    }

    pub fn discount_policy(&self) -> DiscountPolicy {
        self.discount
    }

    pub fn coupons(&self) -> &CouponBook {
        &self.coupons
    }

    /// `round(subtotal × tax_rate)`, halves rounded up.
    pub fn tax(&self, subtotal: Amount) -> Amount {
        (Decimal::from(subtotal) * self.tax_rate)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u64()
            .unwrap_or(Amount::MAX)
    }

    /// Fee for the selected method; nothing selected costs nothing.
    pub fn delivery_price(&self, method: Option<DeliveryMethod>) -> Amount {
        method.map_or(0, |m| self.delivery.price(m))
    }

    /// Prices a subtotal for the given delivery choice.
    ///
    /// The discount never exceeds the subtotal, so tax and delivery are
    /// always charged in full.
    pub fn quote(
        &self,
        subtotal: Amount,
        discount: Amount,
        method: Option<DeliveryMethod>,
    ) -> Quote {
        let discount = discount.min(subtotal);
        let tax = self.tax(subtotal);
        let delivery = self.delivery_price(method);
        let gross = subtotal.saturating_add(tax).saturating_add(delivery);

        let total = match self.discount {
            DiscountPolicy::Ignore => gross,
            DiscountPolicy::Apply => gross.saturating_sub(discount),
        };

        Quote {
            subtotal,
            tax,
            delivery,
            discount,
            total,
        }
    }
}

/// Priced breakdown of a cart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub subtotal: Amount,
    pub tax: Amount,
    pub delivery: Amount,
    pub discount: Amount,
    pub total: Amount,
}
