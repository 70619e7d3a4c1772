//! Boundary parsing for the recommendation record produced upstream.
//!
//! The recommendation step hands back plain `key: value` lines, one field per line. This
//! module turns that text into a [`ProductRecord`] once, so nothing downstream touches
//! string keys.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use stockwise_core::domain::product::{Price, ProductId, ProductRecord, StockStatus};
use thiserror::Error;
use tracing::debug;

const SEPARATOR: &str = ": ";

const REQUIRED_FIELDS: [&str; 10] = [
    "name",
    "id",
    "price",
    "category",
    "maker",
    "score",
    "review_number",
    "file_name",
    "description",
    "recommended_people",
];

const OPTIONAL_FIELDS: [&str; 1] = ["stock_status"];

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("line {line} is not a `key: value` pair: `{content}`")]
    MalformedLine { line: usize, content: String },
    #[error("recommendation is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` has an invalid value `{value}`")]
    InvalidField { field: &'static str, value: String },
}

pub fn parse_recommendation(text: &str) -> Result<ProductRecord, RecordError> {
    let fields = split_fields(text)?;

    let required =
        |field: &'static str| fields.get(field).copied().ok_or(RecordError::MissingField(field));

    let stock_status = match fields.get("stock_status") {
        Some(value) if !value.trim().is_empty() => {
            Some(parse_field::<StockStatus>("stock_status", value)?)
        }
        _ => None,
    };

    Ok(ProductRecord {
        id: ProductId(parse_field("id", required("id")?)?),
        name: required("name")?.to_string(),
        category: required("category")?.to_string(),
        maker: required("maker")?.to_string(),
        price: Price::new(required("price")?),
        score: parse_field::<Decimal>("score", required("score")?)?,
        review_number: parse_field("review_number", required("review_number")?)?,
        file_name: required("file_name")?.to_string(),
        description: required("description")?.to_string(),
        recommended_people: required("recommended_people")?.to_string(),
        stock_status,
    })
}

fn split_fields(text: &str) -> Result<HashMap<&str, &str>, RecordError> {
    let mut fields = HashMap::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(SEPARATOR) else {
            return Err(RecordError::MalformedLine { line: index + 1, content: line.to_string() });
        };

        let key = key.trim();
        if !REQUIRED_FIELDS.contains(&key) && !OPTIONAL_FIELDS.contains(&key) {
            debug!(event_name = "recommendation.unknown_field", field = key, "ignoring field");
            continue;
        }
        fields.insert(key, value);
    }

    Ok(fields)
}

fn parse_field<T: FromStr>(field: &'static str, value: &str) -> Result<T, RecordError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| RecordError::InvalidField { field, value: value.to_string() })
}
