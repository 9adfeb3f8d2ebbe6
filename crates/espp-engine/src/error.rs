use thiserror::Error;

/// Rejections raised while turning raw lot input into purchases.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {value:?}")]
    InvalidField { field: String, value: String },

    #[error("Purchase {purchase_id} sells {sold} shares but only {available} were purchased")]
    OverAllocated {
        purchase_id: String,
        sold: f64,
        available: f64,
    },
}

impl ValidationError {
    pub fn invalid_field(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            value: value.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Market price must be a finite number, got {0}")]
    NonFiniteMarketPrice(f64),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}
