//! Outcome Classification
//!
//! How favorable selling now would be under each disposition timeline,
//! judged from where the market price sits relative to the offering prices.

use crate::purchase::Purchase;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Relative favorability of a disposition; ordered worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxOutcome {
    Good,
    Better,
    Best,
}

impl std::fmt::Display for TaxOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaxOutcome::Good => write!(f, "GOOD"),
            TaxOutcome::Better => write!(f, "BETTER"),
            TaxOutcome::Best => write!(f, "BEST"),
        }
    }
}

/// Direction the stock moved over the offering period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfferingTrend {
    /// Closed above where it opened
    Rising,
    /// Closed below where it opened
    Falling,
    Flat,
    /// An offering price is NaN, so the prices cannot be compared
    Unordered,
}

impl OfferingTrend {
    pub fn of(offer_start_price: f64, offer_end_price: f64) -> Self {
        match offer_end_price.partial_cmp(&offer_start_price) {
            Some(Ordering::Greater) => OfferingTrend::Rising,
            Some(Ordering::Less) => OfferingTrend::Falling,
            Some(Ordering::Equal) => OfferingTrend::Flat,
            None => OfferingTrend::Unordered,
        }
    }

    pub fn for_purchase(purchase: &Purchase) -> Self {
        Self::of(purchase.offer_start_price, purchase.offer_end_price)
    }
}

/// Outcome of selling within a year of purchase.
pub fn disqualifying_stcg_outcome(
    purchase: &Purchase,
    market_price: f64,
    plan_discount: f64,
) -> TaxOutcome {
    match OfferingTrend::for_purchase(purchase) {
        OfferingTrend::Rising => {
            if market_price > purchase.offer_end_price {
                TaxOutcome::Good
            } else if market_price < purchase.offer_start_price {
                TaxOutcome::Best
            } else {
                TaxOutcome::Better
            }
        }
        OfferingTrend::Falling => {
            // Above this the gain exceeds what the plan discount covers
            let discount_ceiling =
                purchase.offer_start_price * plan_discount + purchase.purchase_price;

            if market_price > purchase.offer_end_price {
                if market_price <= discount_ceiling {
                    TaxOutcome::Better
                } else {
                    TaxOutcome::Good
                }
            } else {
                TaxOutcome::Best
            }
        }
        OfferingTrend::Flat | OfferingTrend::Unordered => TaxOutcome::Best,
    }
}

/// Outcome of selling after a year but before the qualifying date.
pub fn disqualifying_ltcg_outcome(purchase: &Purchase, market_price: f64) -> TaxOutcome {
    match OfferingTrend::for_purchase(purchase) {
        OfferingTrend::Rising => {
            if market_price < purchase.offer_start_price {
                TaxOutcome::Best
            } else {
                TaxOutcome::Better
            }
        }
        OfferingTrend::Falling | OfferingTrend::Flat | OfferingTrend::Unordered => {
            TaxOutcome::Best
        }
    }
}

/// Outcome of selling on or after the qualifying date.
pub fn qualifying_outcome(purchase: &Purchase, market_price: f64) -> TaxOutcome {
    match OfferingTrend::for_purchase(purchase) {
        OfferingTrend::Falling if market_price > purchase.offer_end_price => TaxOutcome::Better,
        OfferingTrend::Rising
        | OfferingTrend::Falling
        | OfferingTrend::Flat
        | OfferingTrend::Unordered => TaxOutcome::Best,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    fn purchase(offer_start_price: f64, offer_end_price: f64, purchase_price: f64) -> Purchase {
        let date = NaiveDate::from_ymd_opt(2023, 3, 31).unwrap();
        Purchase {
            id: "p".to_string(),
            grant_date: date,
            purchase_date: date,
            offer_start_price,
            offer_end_price,
            purchase_price,
            shares: 10.0,
            sales: Vec::new(),
        }
    }

    #[test]
    fn test_trend() {
        assert_eq!(OfferingTrend::of(80.0, 120.0), OfferingTrend::Rising);
        assert_eq!(OfferingTrend::of(120.0, 80.0), OfferingTrend::Falling);
        assert_eq!(OfferingTrend::of(100.0, 100.0), OfferingTrend::Flat);
        assert_eq!(OfferingTrend::of(f64::NAN, 100.0), OfferingTrend::Unordered);
        assert_eq!(OfferingTrend::of(100.0, f64::NAN), OfferingTrend::Unordered);
    }

    #[test]
    fn test_outcome_ordering_and_json() {
        assert!(TaxOutcome::Good < TaxOutcome::Better);
        assert!(TaxOutcome::Better < TaxOutcome::Best);
        assert_eq!(serde_json::to_string(&TaxOutcome::Better).unwrap(), "\"BETTER\"");
        assert_eq!(TaxOutcome::Good.to_string(), "GOOD");
    }

    #[test]
    fn test_stcg_rising_offering() {
        let p = purchase(83.12, 120.10, 70.65);
        assert_eq!(disqualifying_stcg_outcome(&p, 125.10, 0.15), TaxOutcome::Good);
        assert_eq!(disqualifying_stcg_outcome(&p, 120.10, 0.15), TaxOutcome::Better);
        assert_eq!(disqualifying_stcg_outcome(&p, 83.12, 0.15), TaxOutcome::Better);
        assert_eq!(disqualifying_stcg_outcome(&p, 80.00, 0.15), TaxOutcome::Best);
    }

    #[test]
    fn test_stcg_falling_offering() {
        // Ceiling: 89.13 * 0.15 + 53.96 = 67.3295
        let p = purchase(89.13, 63.48, 53.96);
        assert_eq!(disqualifying_stcg_outcome(&p, 70.00, 0.15), TaxOutcome::Good);
        assert_eq!(disqualifying_stcg_outcome(&p, 67.00, 0.15), TaxOutcome::Better);
        assert_eq!(disqualifying_stcg_outcome(&p, 63.48, 0.15), TaxOutcome::Best);
        assert_eq!(disqualifying_stcg_outcome(&p, 50.00, 0.15), TaxOutcome::Best);

        // A smaller plan discount lowers the ceiling below 67
        assert_eq!(disqualifying_stcg_outcome(&p, 67.00, 0.10), TaxOutcome::Good);
    }

    #[test]
    fn test_stcg_falling_offering_at_ceiling() {
        // Ceiling: 100 * 0.15 + 70 = 85.0 exactly
        let p = purchase(100.0, 80.0, 70.0);
        assert_eq!(disqualifying_stcg_outcome(&p, 85.0, 0.15), TaxOutcome::Better);
        assert_eq!(disqualifying_stcg_outcome(&p, 85.01, 0.15), TaxOutcome::Good);
        assert_eq!(disqualifying_stcg_outcome(&p, 80.01, 0.15), TaxOutcome::Better);
        assert_eq!(disqualifying_stcg_outcome(&p, 80.0, 0.15), TaxOutcome::Best);
    }

    #[test]
    fn test_ltcg_outcomes() {
        let rising = purchase(83.12, 120.10, 70.65);
        assert_eq!(disqualifying_ltcg_outcome(&rising, 80.0), TaxOutcome::Best);
        assert_eq!(disqualifying_ltcg_outcome(&rising, 83.12), TaxOutcome::Better);
        assert_eq!(disqualifying_ltcg_outcome(&rising, 200.0), TaxOutcome::Better);

        let falling = purchase(89.13, 63.48, 53.96);
        assert_eq!(disqualifying_ltcg_outcome(&falling, 200.0), TaxOutcome::Best);
        assert_eq!(disqualifying_ltcg_outcome(&falling, 10.0), TaxOutcome::Best);
    }

    #[test]
    fn test_qualifying_outcomes() {
        let falling = purchase(89.13, 63.48, 53.96);
        assert_eq!(qualifying_outcome(&falling, 70.0), TaxOutcome::Better);
        assert_eq!(qualifying_outcome(&falling, 63.48), TaxOutcome::Best);

        let rising = purchase(83.12, 120.10, 70.65);
        assert_eq!(qualifying_outcome(&rising, 500.0), TaxOutcome::Best);
    }

    #[test]
    fn test_unordered_offering_resolves_to_best() {
        let p = purchase(f64::NAN, 63.48, 53.96);
        assert_eq!(disqualifying_stcg_outcome(&p, 70.0, 0.15), TaxOutcome::Best);
        assert_eq!(disqualifying_ltcg_outcome(&p, 70.0), TaxOutcome::Best);
        assert_eq!(qualifying_outcome(&p, 70.0), TaxOutcome::Best);
    }

    /// Sweep trends and market positions; every named branch must be hit.
    #[test]
    fn test_every_branch_reachable() {
        let offerings = [
            purchase(80.0, 120.0, 68.0),
            purchase(120.0, 80.0, 68.0),
            purchase(100.0, 100.0, 85.0),
            purchase(f64::NAN, 100.0, 85.0),
        ];
        let mut seen = HashSet::new();

        for p in &offerings {
            let trend = OfferingTrend::for_purchase(p);
            let mut market_price = 1.0;
            while market_price <= 200.0 {
                seen.insert(("stcg", trend, disqualifying_stcg_outcome(p, market_price, 0.15)));
                seen.insert(("ltcg", trend, disqualifying_ltcg_outcome(p, market_price)));
                seen.insert(("qualifying", trend, qualifying_outcome(p, market_price)));
                market_price += 0.5;
            }
        }

        let expected = [
            ("stcg", OfferingTrend::Rising, TaxOutcome::Good),
            ("stcg", OfferingTrend::Rising, TaxOutcome::Better),
            ("stcg", OfferingTrend::Rising, TaxOutcome::Best),
            ("stcg", OfferingTrend::Falling, TaxOutcome::Good),
            ("stcg", OfferingTrend::Falling, TaxOutcome::Better),
            ("stcg", OfferingTrend::Falling, TaxOutcome::Best),
            ("stcg", OfferingTrend::Flat, TaxOutcome::Best),
            ("stcg", OfferingTrend::Unordered, TaxOutcome::Best),
            ("ltcg", OfferingTrend::Rising, TaxOutcome::Better),
            ("ltcg", OfferingTrend::Rising, TaxOutcome::Best),
            ("ltcg", OfferingTrend::Falling, TaxOutcome::Best),
            ("ltcg", OfferingTrend::Flat, TaxOutcome::Best),
            ("ltcg", OfferingTrend::Unordered, TaxOutcome::Best),
            ("qualifying", OfferingTrend::Rising, TaxOutcome::Best),
            ("qualifying", OfferingTrend::Falling, TaxOutcome::Better),
            ("qualifying", OfferingTrend::Falling, TaxOutcome::Best),
            ("qualifying", OfferingTrend::Flat, TaxOutcome::Best),
            ("qualifying", OfferingTrend::Unordered, TaxOutcome::Best),
        ];

        for branch in expected {
            assert!(seen.contains(&branch), "branch not reached: {:?}", branch);
        }
        assert_eq!(seen.len(), expected.len());
    }
}
