use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Currency units accepted after the amount, matched case-insensitively.
const CURRENCY_UNITS: &[&str] = &["円", "yen", "jpy"];
const THOUSANDS_SEPARATOR: char = ',';

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    #[serde(alias = "あり")]
    InStock,
    #[serde(alias = "残りわずか")]
    LowStock,
    #[serde(alias = "なし")]
    OutOfStock,
}

impl StockStatus {
    pub const ALL: [StockStatus; 3] = [Self::InStock, Self::LowStock, Self::OutOfStock];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InStock => "in_stock",
            Self::LowStock => "low_stock",
            Self::OutOfStock => "out_of_stock",
        }
    }

    pub fn is_available(self) -> bool {
        self != Self::OutOfStock
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown stock status `{0}` (expected in_stock|low_stock|out_of_stock)")]
pub struct UnknownStockStatus(pub String);

impl FromStr for StockStatus {
    type Err = UnknownStockStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "in_stock" | "あり" => Ok(Self::InStock),
            "low_stock" | "残りわずか" => Ok(Self::LowStock),
            "out_of_stock" | "なし" => Ok(Self::OutOfStock),
            other => Err(UnknownStockStatus(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("price `{raw}` is not a currency amount")]
pub struct PriceParseError {
    pub raw: String,
}

/// Display-formatted price such as `12,345円`.
///
/// The raw text is kept verbatim so a catalog round-trip never reformats it; the numeric
/// amount is only parsed when a decision needs it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(String);

impl Price {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn amount(&self) -> Result<u64, PriceParseError> {
        parse_price_amount(&self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn parse_price_amount(raw: &str) -> Result<u64, PriceParseError> {
    let invalid = || PriceParseError { raw: raw.to_string() };

    let without_unit = strip_currency_unit(raw.trim()).trim_end();
    let digits: String = without_unit.chars().filter(|ch| *ch != THOUSANDS_SEPARATOR).collect();
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(invalid());
    }

    digits.parse::<u64>().map_err(|_| invalid())
}

fn strip_currency_unit(value: &str) -> &str {
    for unit in CURRENCY_UNITS {
        let Some(split_at) = value.len().checked_sub(unit.len()) else {
            continue;
        };
        if !value.is_char_boundary(split_at) {
            continue;
        }
        let (head, tail) = value.split_at(split_at);
        if tail.eq_ignore_ascii_case(unit) {
            return head;
        }
    }
    value
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub maker: String,
    pub price: Price,
    #[serde(with = "rust_decimal::serde::str")]
    pub score: Decimal,
    pub review_number: u32,
    pub file_name: String,
    pub description: String,
    pub recommended_people: String,
    #[serde(default)]
    pub stock_status: Option<StockStatus>,
}

impl ProductRecord {
    /// Rows that were never synthesized are treated as in stock.
    pub fn effective_stock_status(&self) -> StockStatus {
        self.stock_status.unwrap_or(StockStatus::InStock)
    }

    pub fn is_available(&self) -> bool {
        self.effective_stock_status().is_available()
    }
}
