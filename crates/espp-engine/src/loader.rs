//! Purchase Loader
//!
//! Normalizes string-encoded lots into typed purchases. Two modes:
//!
//! - **Lenient** keeps the historical contract: a malformed number becomes
//!   `NaN` and flows through every calculation built on it. Callers are
//!   expected to gate input with [`RawLotInput::is_valid`] first.
//! - **Strict** rejects malformed or non-finite numbers and over-allocated
//!   sales with a [`ValidationError`].
//!
//! Dates are rejected in both modes; there is no date equivalent of `NaN`.
//!
//! [`RawLotInput::is_valid`]: crate::purchase::RawLotInput::is_valid

use crate::dates::parse_date;
use crate::error::ValidationError;
use crate::purchase::{check_share_allocation, Purchase, RawLot, RawSale, Sale};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    #[default]
    Lenient,
    Strict,
}

/// Load purchases, letting malformed numbers through as `NaN`.
pub fn load_purchases(raw_lots: &[RawLot]) -> Result<Vec<Purchase>, ValidationError> {
    load_purchases_with(raw_lots, LoadMode::Lenient)
}

/// Load purchases, failing on the first malformed field or over-allocated lot.
pub fn load_purchases_strict(raw_lots: &[RawLot]) -> Result<Vec<Purchase>, ValidationError> {
    load_purchases_with(raw_lots, LoadMode::Strict)
}

pub fn load_purchases_with(
    raw_lots: &[RawLot],
    mode: LoadMode,
) -> Result<Vec<Purchase>, ValidationError> {
    let purchases = raw_lots
        .iter()
        .map(|lot| load_purchase(lot, mode))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!("Loaded {} ESPP purchases ({:?})", purchases.len(), mode);

    Ok(purchases)
}

fn load_purchase(lot: &RawLot, mode: LoadMode) -> Result<Purchase, ValidationError> {
    let input = &lot.input;
    let field = |name: &str| format!("lot {}: {}", lot.id, name);

    let purchase = Purchase {
        id: lot.id.clone(),
        grant_date: parse_date(&field("grantDate"), &input.grant_date)?,
        purchase_date: parse_date(&field("purchaseDate"), &input.purchase_date)?,
        offer_start_price: parse_number(&field("offerStartPrice"), &input.offer_start_price, mode)?,
        offer_end_price: parse_number(&field("offerEndPrice"), &input.offer_end_price, mode)?,
        purchase_price: parse_number(&field("purchasePrice"), &input.purchase_price, mode)?,
        shares: parse_number(&field("shares"), &input.shares, mode)?,
        sales: lot
            .sales
            .iter()
            .map(|sale| load_sale(&lot.id, sale, mode))
            .collect::<Result<Vec<_>, _>>()?,
    };

    if let Err(err) = check_share_allocation(&purchase) {
        match mode {
            LoadMode::Strict => return Err(err),
            LoadMode::Lenient => tracing::warn!("{}", err),
        }
    }

    Ok(purchase)
}

fn load_sale(lot_id: &str, sale: &RawSale, mode: LoadMode) -> Result<Sale, ValidationError> {
    let field = |name: &str| format!("lot {} sale {}: {}", lot_id, sale.id, name);

    Ok(Sale {
        id: sale.id.clone(),
        date: parse_date(&field("date"), &sale.date)?,
        price: parse_number(&field("price"), &sale.price, mode)?,
        shares: parse_number(&field("shares"), &sale.shares, mode)?,
    })
}

fn parse_number(field: &str, value: &str, mode: LoadMode) -> Result<f64, ValidationError> {
    let parsed = value.trim().parse::<f64>().ok();

    match (parsed, mode) {
        (Some(number), LoadMode::Strict) if number.is_finite() => Ok(number),
        (_, LoadMode::Strict) => Err(ValidationError::invalid_field(field, value)),
        (Some(number), LoadMode::Lenient) => Ok(number),
        (None, LoadMode::Lenient) => {
            tracing::warn!("{} is not a number ({:?}); using NaN", field, value);
            Ok(f64::NAN)
        }
    }
}
