//! ESPP Engine
//!
//! Tax-lot calculations for Employee Stock Purchase Plan purchases: the
//! discount fixed at purchase, the tax owed under each disposition timeline
//! at a quoted market price, and the single timeline each recorded sale falls
//! under. Pure functions over plain records; no I/O.

pub mod calculator;
pub mod dates;
pub mod disposition;
pub mod error;
pub mod loader;
pub mod outcome;
pub mod policy;
pub mod purchase;
pub mod sale_allocator;

pub use calculator::{
    apply_market_price, clear_market_dependent_values, compute_purchase_taxes,
    load_purchases_taxes, load_purchases_taxes_with, parse_market_price, sort_by_grant_date,
    update_market_dependent_values, EsppCalculator, PurchaseGains, PurchaseTaxes,
};
pub use disposition::{Disposition, DispositionName, Dispositions, Taxes};
pub use error::{EngineError, PolicyError, ValidationError};
pub use loader::{load_purchases, load_purchases_strict, load_purchases_with, LoadMode};
pub use outcome::{OfferingTrend, TaxOutcome};
pub use policy::TaxRatePolicy;
pub use purchase::{
    check_share_allocation, Purchase, RawLot, RawLotInput, RawSale, Sale, REQUIRED_FIELDS,
};
pub use sale_allocator::{
    compute_all_sale_taxes, compute_sale_taxes, SaleGains, SalePurchaseRef, SaleTaxes,
};
