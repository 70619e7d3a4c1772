//! Catalog-side logic for the stockwise recommendation demo.
//!
//! - `catalog` - CSV load/save of the product catalog
//! - `stock` - tiered, randomized stock-status synthesis
//! - `alternatives` - substitute lookup for out-of-stock recommendations
//! - `config` - layered configuration (defaults, file, env, overrides)

pub mod alternatives;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod stock;

pub use alternatives::{
    find_alternative, find_alternative_in_file, resolve_alternative, resolve_alternative_in_file,
    Alternative, AlternativeReason, ResolvedAlternative,
};
pub use catalog::{load_catalog, save_catalog, Catalog};
pub use domain::product::{Price, ProductId, ProductRecord, StockStatus};
pub use errors::{ApplicationError, DomainError};
pub use stock::{
    DrawMode, DrawSource, RngDraws, StockAssessment, StockDistribution, StockSynthesizer, Tier,
};
