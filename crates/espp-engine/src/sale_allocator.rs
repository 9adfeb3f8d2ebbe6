//! Sale Allocator
//!
//! Splits a purchase's discount across its recorded sales by share count and
//! resolves each sale to the single disposition its date falls under, using
//! the sale price in place of a quoted market price.

use crate::calculator::{market_gain, PurchaseTaxes};
use crate::disposition::{Disposition, DispositionInputs, DispositionName};
use crate::policy::TaxRatePolicy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Gains realized by one sale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleGains {
    /// Share of the purchase discount carried by the sold shares
    pub discount_amount: f64,
    pub market: f64,
    pub total: f64,
}

/// The purchase a sale came out of
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalePurchaseRef {
    pub id: String,
    pub purchase_date: NaiveDate,
    pub purchase_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleTaxes {
    pub id: String,
    pub date: NaiveDate,
    pub price: f64,
    pub shares: f64,
    pub purchase: SalePurchaseRef,
    pub gains: SaleGains,
    pub disposition: Disposition,
}

/// Tax records for every sale recorded against `taxes`, in recorded order.
pub fn compute_sale_taxes(taxes: &PurchaseTaxes, policy: &TaxRatePolicy) -> Vec<SaleTaxes> {
    let purchase = &taxes.purchase;

    purchase
        .sales
        .iter()
        .map(|sale| {
            let sale_fraction = sale.shares / purchase.shares;
            let discount_amount = taxes.gains.discount_amount * sale_fraction;
            let market = market_gain(purchase.offer_end_price, sale.price, sale.shares);

            let name = DispositionName::for_sale_date(purchase, sale.date);
            let inputs = DispositionInputs {
                purchase,
                discount_amount,
                market_gain: market,
                market_price: sale.price,
                shares: sale.shares,
            };

            SaleTaxes {
                id: sale.id.clone(),
                date: sale.date,
                price: sale.price,
                shares: sale.shares,
                purchase: SalePurchaseRef {
                    id: purchase.id.clone(),
                    purchase_date: purchase.purchase_date,
                    purchase_price: purchase.purchase_price,
                },
                gains: SaleGains {
                    discount_amount,
                    market,
                    total: discount_amount + market,
                },
                disposition: Disposition::evaluate(name, &inputs, policy),
            }
        })
        .collect()
}

/// Sale records across all purchases, ordered by sale date.
pub fn compute_all_sale_taxes(
    purchases: &[PurchaseTaxes],
    policy: &TaxRatePolicy,
) -> Vec<SaleTaxes> {
    let mut sales: Vec<SaleTaxes> = purchases
        .iter()
        .flat_map(|taxes| compute_sale_taxes(taxes, policy))
        .collect();
    sales.sort_by_key(|sale| sale.date);

    tracing::debug!(
        "Allocated {} ESPP sales across {} purchases",
        sales.len(),
        purchases.len()
    );

    sales
}
