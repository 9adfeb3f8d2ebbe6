//! Dispositions
//!
//! The three tax timelines a share sale can fall under, and the tax each one
//! produces for a given discount, market gain, and price.

use crate::dates::{long_term_date, qualifying_date};
use crate::outcome::{
    disqualifying_ltcg_outcome, disqualifying_stcg_outcome, qualifying_outcome, TaxOutcome,
};
use crate::policy::TaxRatePolicy;
use crate::purchase::Purchase;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispositionName {
    /// Sold within a year of purchase
    DisqualifyingStcg,
    /// Sold after a year but before the qualifying date
    DisqualifyingLtcg,
    /// Sold two years after grant and one year after purchase
    Qualifying,
}

impl DispositionName {
    pub const ALL: [DispositionName; 3] = [
        DispositionName::DisqualifyingStcg,
        DispositionName::DisqualifyingLtcg,
        DispositionName::Qualifying,
    ];

    /// Timeline a sale on `date` falls under.
    pub fn for_sale_date(purchase: &Purchase, date: NaiveDate) -> Self {
        if date < long_term_date(purchase.purchase_date) {
            DispositionName::DisqualifyingStcg
        } else if date < qualifying_date(purchase.grant_date, purchase.purchase_date) {
            DispositionName::DisqualifyingLtcg
        } else {
            DispositionName::Qualifying
        }
    }
}

impl std::fmt::Display for DispositionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispositionName::DisqualifyingStcg => write!(f, "DISQUALIFYING_STCG"),
            DispositionName::DisqualifyingLtcg => write!(f, "DISQUALIFYING_LTCG"),
            DispositionName::Qualifying => write!(f, "QUALIFYING"),
        }
    }
}

/// Tax liability split by treatment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Taxes {
    pub ordinary_income: f64,
    pub stcg: f64,
    pub ltcg: f64,
    pub total: f64,
}

impl Taxes {
    pub fn new(ordinary_income: f64, stcg: f64, ltcg: f64) -> Self {
        Self {
            ordinary_income,
            stcg,
            ltcg,
            total: ordinary_income + stcg + ltcg,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disposition {
    pub name: DispositionName,
    pub taxes: Taxes,
    pub outcome: TaxOutcome,
    /// Last day (exclusive) this timeline applies; `None` when open-ended
    pub end_date: Option<NaiveDate>,
}

/// Values a disposition is evaluated against. For a whole purchase these are
/// the purchase's own gains and share count; for a sale, the sale's.
#[derive(Debug, Clone, Copy)]
pub struct DispositionInputs<'a> {
    pub purchase: &'a Purchase,
    pub discount_amount: f64,
    pub market_gain: f64,
    /// Market price, or the sale price for a recorded sale
    pub market_price: f64,
    pub shares: f64,
}

impl Disposition {
    pub fn evaluate(
        name: DispositionName,
        inputs: &DispositionInputs<'_>,
        policy: &TaxRatePolicy,
    ) -> Self {
        let purchase = inputs.purchase;

        match name {
            DispositionName::DisqualifyingStcg => Self {
                name,
                taxes: disqualifying_stcg_taxes(inputs.discount_amount, inputs.market_gain, policy),
                outcome: disqualifying_stcg_outcome(
                    purchase,
                    inputs.market_price,
                    policy.plan_discount,
                ),
                end_date: Some(long_term_date(purchase.purchase_date)),
            },
            DispositionName::DisqualifyingLtcg => Self {
                name,
                taxes: disqualifying_ltcg_taxes(inputs.discount_amount, inputs.market_gain, policy),
                outcome: disqualifying_ltcg_outcome(purchase, inputs.market_price),
                end_date: Some(qualifying_date(purchase.grant_date, purchase.purchase_date)),
            },
            DispositionName::Qualifying => Self {
                name,
                taxes: qualifying_taxes(
                    purchase.offer_start_price,
                    purchase.purchase_price,
                    inputs.market_price,
                    inputs.shares,
                    policy,
                ),
                outcome: qualifying_outcome(purchase, inputs.market_price),
                end_date: None,
            },
        }
    }
}

/// All three timelines for one purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispositions {
    #[serde(rename = "disqualifyingSTCG")]
    pub disqualifying_stcg: Disposition,
    #[serde(rename = "disqualifyingLTCG")]
    pub disqualifying_ltcg: Disposition,
    pub qualifying: Disposition,
}

impl Dispositions {
    pub fn evaluate(inputs: &DispositionInputs<'_>, policy: &TaxRatePolicy) -> Self {
        Self {
            disqualifying_stcg: Disposition::evaluate(
                DispositionName::DisqualifyingStcg,
                inputs,
                policy,
            ),
            disqualifying_ltcg: Disposition::evaluate(
                DispositionName::DisqualifyingLtcg,
                inputs,
                policy,
            ),
            qualifying: Disposition::evaluate(DispositionName::Qualifying, inputs, policy),
        }
    }

    pub fn get(&self, name: DispositionName) -> &Disposition {
        match name {
            DispositionName::DisqualifyingStcg => &self.disqualifying_stcg,
            DispositionName::DisqualifyingLtcg => &self.disqualifying_ltcg,
            DispositionName::Qualifying => &self.qualifying,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Disposition> {
        DispositionName::ALL.into_iter().map(move |name| self.get(name))
    }
}

/// Short-term disqualifying sale: discount and market gain are both taxed as
/// ordinary income.
pub fn disqualifying_stcg_taxes(
    discount_amount: f64,
    market_gain: f64,
    policy: &TaxRatePolicy,
) -> Taxes {
    Taxes::new(
        discount_amount * policy.ordinary_income_rate,
        market_gain * policy.ordinary_income_rate,
        0.0,
    )
}

/// Long-term disqualifying sale: a market loss reduces the ordinary-income
/// discount; a market gain is taxed at the long-term rate.
pub fn disqualifying_ltcg_taxes(
    discount_amount: f64,
    market_gain: f64,
    policy: &TaxRatePolicy,
) -> Taxes {
    let (ordinary_base, ltcg) = if market_gain < 0.0 {
        (discount_amount + market_gain, 0.0)
    } else {
        (
            discount_amount,
            market_gain * policy.long_term_capital_gains_rate,
        )
    };

    Taxes::new(ordinary_base * policy.ordinary_income_rate, 0.0, ltcg)
}

/// Qualifying sale: ordinary income is the lesser of the actual gain and the
/// plan discount on the offering start price; the rest is long-term gain.
pub fn qualifying_taxes(
    offer_start_price: f64,
    purchase_price: f64,
    market_price: f64,
    shares: f64,
    policy: &TaxRatePolicy,
) -> Taxes {
    let qualifying_gain = (market_price - purchase_price) * shares;
    let qualifying_discount = offer_start_price * policy.plan_discount * shares;

    let ordinary_base = min_or_nan(qualifying_discount, qualifying_gain);

    Taxes::new(
        ordinary_base * policy.ordinary_income_rate,
        0.0,
        (qualifying_gain - ordinary_base) * policy.long_term_capital_gains_rate,
    )
}

/// Lesser of two values. Unlike `f64::min`, a NaN operand yields NaN so a
/// poisoned input never turns into a plausible number.
pub(crate) fn min_or_nan(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}
