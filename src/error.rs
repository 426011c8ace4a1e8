// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Form-level validation failures.
//!
//! These are raised before anything touches the store. Storage and lookup
//! failures stay as `anyhow::Error` with context attached at the call site.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: Decimal },

    #[error("{field} cannot be negative (got {value})")]
    Negative { field: &'static str, value: Decimal },

    #[error("{later} ({later_date}) must not be before {earlier} ({earlier_date})")]
    DateOrder {
        earlier: &'static str,
        earlier_date: String,
        later: &'static str,
        later_date: String,
    },

    #[error("{field} must be one of: {allowed} (got '{value}')")]
    InvalidChoice {
        field: &'static str,
        value: String,
        allowed: &'static str,
    },

    #[error("Invalid color '{0}', expected #RRGGBB")]
    InvalidColor(String),

    #[error("{0}")]
    Rule(String),
}

/// Reject zero and negative amounts.
pub fn require_positive(field: &'static str, value: Decimal) -> Result<Decimal, ValidationError> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::NotPositive { field, value });
    }
    Ok(value)
}

pub fn require_non_negative(
    field: &'static str,
    value: Decimal,
) -> Result<Decimal, ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(value)
}

pub fn require_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(v.to_string())
}
