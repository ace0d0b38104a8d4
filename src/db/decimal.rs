//! Exact conversion between `BigDecimal` and BSON `Decimal128`.
//!
//! Both sides go through the decimal string form. A value that would not
//! come back unchanged is rejected rather than rounded.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use mongodb::bson::Decimal128;

use crate::ports::{RepositoryError, RepositoryResult};

pub fn to_decimal128(value: &BigDecimal) -> RepositoryResult<Decimal128> {
    let encoded = Decimal128::from_str(&value.to_string()).map_err(|_| {
        RepositoryError::InvalidAmount(format!("{} is not representable as Decimal128", value))
    })?;

    if from_decimal128(&encoded)? != *value {
        return Err(RepositoryError::InvalidAmount(format!(
            "{} does not fit in 34 significant digits",
            value
        )));
    }
    Ok(encoded)
}

pub fn from_decimal128(value: &Decimal128) -> RepositoryResult<BigDecimal> {
    let text = value.to_string();
    BigDecimal::from_str(&text)
        .map_err(|_| RepositoryError::InvalidAmount(format!("unreadable Decimal128 {}", text)))
}
