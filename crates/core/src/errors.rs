use std::path::PathBuf;

use thiserror::Error;

use crate::domain::product::ProductId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("product {product_id} has an unparsable price `{raw}`")]
    InvalidPrice { product_id: ProductId, raw: String },
    #[error("product id {0} appears more than once in the catalog")]
    DuplicateProductId(ProductId),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("catalog file was not found: `{}`", .0.display())]
    CatalogNotFound(PathBuf),
    #[error("malformed catalog record in `{}`: {message}", path.display())]
    MalformedRecord { path: PathBuf, message: String },
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Stable classification surfaced to operators in command payloads.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::InvalidPrice { .. }) => "invalid_price",
            Self::Domain(DomainError::DuplicateProductId(_)) => "duplicate_product_id",
            Self::Domain(DomainError::InvariantViolation(_)) => "domain_invariant",
            Self::CatalogNotFound(_) => "catalog_not_found",
            Self::MalformedRecord { .. } => "malformed_record",
            Self::Persistence(_) => "persistence",
            Self::Configuration(_) => "config_validation",
        }
    }
}
