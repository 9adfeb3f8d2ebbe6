//! Purchase Tax Calculator
//!
//! Static per-purchase values fixed at load time, and the market-dependent
//! layer (market gain, total gain, dispositions) that is attached for a
//! quoted price and stripped again when the price goes away.
//!
//! Every operation returns new records; inputs are never modified.

use crate::disposition::{min_or_nan, DispositionInputs, Dispositions};
use crate::error::{EngineError, ValidationError};
use crate::loader::{load_purchases_with, LoadMode};
use crate::policy::TaxRatePolicy;
use crate::purchase::{Purchase, RawLot};
use crate::sale_allocator::{compute_all_sale_taxes, SaleTaxes};
use serde::{Deserialize, Serialize};

/// Gains on a whole purchase. `market` and `total` are only present while a
/// market price is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseGains {
    /// Value of the purchase discount, fixed at load time
    pub discount_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseTaxes {
    #[serde(flatten)]
    pub purchase: Purchase,
    /// Look-back price: the lower of the offering start and end prices
    pub purchase_market_price: f64,
    pub gains: PurchaseGains,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispositions: Option<Dispositions>,
}

impl PurchaseTaxes {
    pub fn has_market_values(&self) -> bool {
        self.dispositions.is_some()
    }
}

/// Look-back price used as the plan's purchase basis
pub fn purchase_market_price(offer_start_price: f64, offer_end_price: f64) -> f64 {
    min_or_nan(offer_start_price, offer_end_price)
}

/// Discount realized at purchase: what the shares were worth when the
/// offering closed, less what was paid for them.
pub fn discount_amount(offer_end_price: f64, purchase_price: f64, shares: f64) -> f64 {
    (offer_end_price - purchase_price) * shares
}

/// Gain (or loss) since the offering closed.
pub fn market_gain(offer_end_price: f64, market_price: f64, shares: f64) -> f64 {
    (market_price - offer_end_price) * shares
}

pub fn compute_purchase_taxes(purchase: &Purchase) -> PurchaseTaxes {
    PurchaseTaxes {
        purchase: purchase.clone(),
        purchase_market_price: purchase_market_price(
            purchase.offer_start_price,
            purchase.offer_end_price,
        ),
        gains: PurchaseGains {
            discount_amount: discount_amount(
                purchase.offer_end_price,
                purchase.purchase_price,
                purchase.shares,
            ),
            market: None,
            total: None,
        },
        dispositions: None,
    }
}

/// Load raw lots leniently and derive their static tax values.
pub fn load_purchases_taxes(raw_lots: &[RawLot]) -> Result<Vec<PurchaseTaxes>, ValidationError> {
    load_purchases_taxes_with(raw_lots, LoadMode::Lenient)
}

pub fn load_purchases_taxes_with(
    raw_lots: &[RawLot],
    mode: LoadMode,
) -> Result<Vec<PurchaseTaxes>, ValidationError> {
    Ok(load_purchases_with(raw_lots, mode)?
        .iter()
        .map(compute_purchase_taxes)
        .collect())
}

/// Attach market gain, total gain, and all three dispositions for
/// `market_price`. Non-finite prices are rejected; use
/// [`apply_market_price`] to fall back to clearing instead.
pub fn update_market_dependent_values(
    purchases: &[PurchaseTaxes],
    market_price: f64,
    policy: &TaxRatePolicy,
) -> Result<Vec<PurchaseTaxes>, EngineError> {
    if !market_price.is_finite() {
        return Err(EngineError::NonFiniteMarketPrice(market_price));
    }

    tracing::debug!(
        "Updating {} ESPP purchases for market price {}",
        purchases.len(),
        market_price
    );

    Ok(purchases
        .iter()
        .map(|purchase| with_market_price(purchase, market_price, policy))
        .collect())
}

/// Drop every market-dependent value, restoring the load-time record.
pub fn clear_market_dependent_values(purchases: &[PurchaseTaxes]) -> Vec<PurchaseTaxes> {
    purchases
        .iter()
        .map(|purchase| PurchaseTaxes {
            gains: PurchaseGains {
                market: None,
                total: None,
                ..purchase.gains
            },
            dispositions: None,
            ..purchase.clone()
        })
        .collect()
}

/// Parse a typed-in market price. Blank, malformed, and non-finite input all
/// count as "no price".
pub fn parse_market_price(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
}

/// Update for a usable price, clear otherwise.
pub fn apply_market_price(
    purchases: &[PurchaseTaxes],
    market_price: Option<f64>,
    policy: &TaxRatePolicy,
) -> Vec<PurchaseTaxes> {
    match market_price.filter(|price| price.is_finite()) {
        Some(price) => purchases
            .iter()
            .map(|purchase| with_market_price(purchase, price, policy))
            .collect(),
        None => clear_market_dependent_values(purchases),
    }
}

/// Order purchases by grant date; equal dates keep their input order.
pub fn sort_by_grant_date(mut purchases: Vec<PurchaseTaxes>) -> Vec<PurchaseTaxes> {
    purchases.sort_by_key(|taxes| taxes.purchase.grant_date);
    purchases
}

fn with_market_price(
    taxes: &PurchaseTaxes,
    market_price: f64,
    policy: &TaxRatePolicy,
) -> PurchaseTaxes {
    let purchase = &taxes.purchase;
    let discount_amount = taxes.gains.discount_amount;
    let market = market_gain(purchase.offer_end_price, market_price, purchase.shares);

    let inputs = DispositionInputs {
        purchase,
        discount_amount,
        market_gain: market,
        market_price,
        shares: purchase.shares,
    };

    PurchaseTaxes {
        gains: PurchaseGains {
            discount_amount,
            market: Some(market),
            total: Some(discount_amount + market),
        },
        dispositions: Some(Dispositions::evaluate(&inputs, policy)),
        ..taxes.clone()
    }
}

/// Calculator bound to one tax-rate policy
#[derive(Debug, Clone, Default)]
pub struct EsppCalculator {
    policy: TaxRatePolicy,
}

impl EsppCalculator {
    pub fn new(policy: TaxRatePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &TaxRatePolicy {
        &self.policy
    }

    pub fn update(
        &self,
        purchases: &[PurchaseTaxes],
        market_price: f64,
    ) -> Result<Vec<PurchaseTaxes>, EngineError> {
        update_market_dependent_values(purchases, market_price, &self.policy)
    }

    pub fn apply(
        &self,
        purchases: &[PurchaseTaxes],
        market_price: Option<f64>,
    ) -> Vec<PurchaseTaxes> {
        apply_market_price(purchases, market_price, &self.policy)
    }

    pub fn sale_taxes(&self, purchases: &[PurchaseTaxes]) -> Vec<SaleTaxes> {
        compute_all_sale_taxes(purchases, &self.policy)
    }
}
