use serde::Serialize;
use stockwise_core::alternatives::{resolve_alternative, AlternativeReason};
use stockwise_core::catalog::load_catalog;
use stockwise_core::config::{AppConfig, LoadOptions};
use stockwise_core::domain::product::{ProductId, ProductRecord, StockStatus};
use stockwise_core::errors::ApplicationError;

use crate::commands::{CommandResult, CATALOG_EXIT_CODE};

const COMMAND: &str = "alternative";

#[derive(Debug, Serialize)]
struct AlternativeReport {
    product_id: ProductId,
    stock_status: StockStatus,
    reason: Option<AlternativeReason>,
    alternative: Option<AlternativeSummary>,
}

#[derive(Debug, Serialize)]
struct AlternativeSummary {
    id: ProductId,
    name: String,
    category: String,
    price: String,
    score: String,
    stock_status: StockStatus,
}

impl From<&ProductRecord> for AlternativeSummary {
    fn from(product: &ProductRecord) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price.to_string(),
            score: product.score.to_string(),
            stock_status: product.effective_stock_status(),
        }
    }
}

pub fn run(options: LoadOptions, product_id: u64) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::from_error(
                COMMAND,
                &ApplicationError::Configuration(error.to_string()),
            )
        }
    };

    let catalog = match load_catalog(&config.catalog.path) {
        Ok(catalog) => catalog,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };

    let product_id = ProductId(product_id);
    let Some(target) = catalog.find(product_id) else {
        return CommandResult::failure(
            COMMAND,
            "product_not_found",
            format!("product {product_id} is not in the catalog"),
            CATALOG_EXIT_CODE,
        );
    };

    let resolved = resolve_alternative(target, catalog.products());
    let report = AlternativeReport {
        product_id,
        stock_status: target.effective_stock_status(),
        reason: resolved.map(|alternative| alternative.reason),
        alternative: resolved.map(|alternative| AlternativeSummary::from(alternative.product)),
    };

    let message = match &report.alternative {
        Some(alternative) => {
            format!("suggest {} ({}) instead of product {product_id}", alternative.name, alternative.id)
        }
        None => format!("no available alternative for product {product_id}"),
    };
    CommandResult::success(COMMAND, message, report)
}
