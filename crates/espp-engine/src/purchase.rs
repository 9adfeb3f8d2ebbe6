//! ESPP Purchases
//!
//! Raw lot input as it arrives from the lot API, and the typed purchase and
//! sale records the loader produces from it.

use crate::error::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Share counts closer than this are treated as equal when checking that
/// sales do not exceed the purchase.
pub const SHARE_TOLERANCE: f64 = 1e-9;

/// Fields a lot input must carry, in entry-form order
pub const REQUIRED_FIELDS: [&str; 6] = [
    "grantDate",
    "purchaseDate",
    "offerStartPrice",
    "offerEndPrice",
    "purchasePrice",
    "shares",
];

/// User-entered lot fields, all string-encoded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLotInput {
    pub grant_date: String,
    pub purchase_date: String,
    pub offer_start_price: String,
    pub offer_end_price: String,
    pub purchase_price: String,
    pub shares: String,
}

impl RawLotInput {
    /// An input with every field blank, as a fresh entry form starts out
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a field by its wire name
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "grantDate" => &self.grant_date,
            "purchaseDate" => &self.purchase_date,
            "offerStartPrice" => &self.offer_start_price,
            "offerEndPrice" => &self.offer_end_price,
            "purchasePrice" => &self.purchase_price,
            "shares" => &self.shares,
            _ => return None,
        };

        Some(value.as_str())
    }

    /// Required fields that are empty or whitespace-only
    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|name| self.field(name).map_or(true, |value| value.trim().is_empty()))
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// A stored lot: its identifier, the entered fields, and any recorded sales
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLot {
    pub id: String,
    #[serde(flatten)]
    pub input: RawLotInput,
    #[serde(default)]
    pub sales: Vec<RawSale>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSale {
    pub id: String,
    pub date: String,
    pub price: String,
    pub shares: String,
}

/// A disposal of some or all shares from a purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub date: NaiveDate,
    /// Sale price per share
    pub price: f64,
    pub shares: f64,
}

/// One ESPP offering/purchase event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: String,
    pub grant_date: NaiveDate,
    pub purchase_date: NaiveDate,
    /// Market price when the offering period opened
    pub offer_start_price: f64,
    /// Market price when the offering period closed
    pub offer_end_price: f64,
    /// Price actually paid per share
    pub purchase_price: f64,
    pub shares: f64,
    pub sales: Vec<Sale>,
}

impl Purchase {
    /// Shares recorded as sold across every sale
    pub fn sold_shares(&self) -> f64 {
        self.sales.iter().map(|sale| sale.shares).sum()
    }

    /// Shares still held; negative when sales are over-allocated
    pub fn remaining_shares(&self) -> f64 {
        self.shares - self.sold_shares()
    }

    pub fn is_fully_sold(&self) -> bool {
        self.remaining_shares().abs() <= SHARE_TOLERANCE
    }
}

/// Reject a purchase whose sales add up to more shares than were bought.
pub fn check_share_allocation(purchase: &Purchase) -> Result<(), ValidationError> {
    let sold = purchase.sold_shares();

    if sold > purchase.shares + SHARE_TOLERANCE {
        return Err(ValidationError::OverAllocated {
            purchase_id: purchase.id.clone(),
            sold,
            available: purchase.shares,
        });
    }

    Ok(())
}
