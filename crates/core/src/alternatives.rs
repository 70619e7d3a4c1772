use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::load_catalog;
use crate::domain::product::ProductRecord;
use crate::errors::ApplicationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlternativeReason {
    /// Highest-rated available product in the target's own category.
    SameCategory,
    /// Nothing available in the category; highest-rated available product overall.
    CatalogWide,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Alternative<'a> {
    pub product: &'a ProductRecord,
    pub reason: AlternativeReason,
}

/// Owned [`Alternative`], for callers that drop the catalog after the lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedAlternative {
    pub product: ProductRecord,
    pub reason: AlternativeReason,
}

impl From<Alternative<'_>> for ResolvedAlternative {
    fn from(alternative: Alternative<'_>) -> Self {
        Self { product: alternative.product.clone(), reason: alternative.reason }
    }
}

/// Substitute for an out-of-stock product, or `None` when nothing in the catalog is
/// available.
pub fn find_alternative<'a>(
    target: &ProductRecord,
    catalog: &'a [ProductRecord],
) -> Option<&'a ProductRecord> {
    resolve_alternative(target, catalog).map(|alternative| alternative.product)
}

pub fn resolve_alternative<'a>(
    target: &ProductRecord,
    catalog: &'a [ProductRecord],
) -> Option<Alternative<'a>> {
    let same_category = highest_scored(catalog.iter().filter(|candidate| {
        candidate.category == target.category
            && candidate.is_available()
            && candidate.id != target.id
    }));
    if let Some(product) = same_category {
        return Some(Alternative { product, reason: AlternativeReason::SameCategory });
    }

    // The catalog-wide pass does not exclude the target itself.
    let anywhere = highest_scored(catalog.iter().filter(|candidate| candidate.is_available()));
    if anywhere.is_none() {
        debug!(
            event_name = "alternative.exhausted",
            product_id = %target.id,
            "no available product in catalog"
        );
    }
    anywhere.map(|product| Alternative { product, reason: AlternativeReason::CatalogWide })
}

/// Loads the catalog at `path` and resolves against it. A missing file means there is
/// nothing to offer, not a failure.
pub fn find_alternative_in_file(
    target: &ProductRecord,
    path: &Path,
) -> Result<Option<ProductRecord>, ApplicationError> {
    Ok(resolve_alternative_in_file(target, path)?.map(|found| found.product))
}

pub fn resolve_alternative_in_file(
    target: &ProductRecord,
    path: &Path,
) -> Result<Option<ResolvedAlternative>, ApplicationError> {
    let catalog = match load_catalog(path) {
        Ok(catalog) => catalog,
        Err(ApplicationError::CatalogNotFound(_)) => {
            debug!(
                event_name = "alternative.catalog_missing",
                product_id = %target.id,
                catalog_path = %path.display(),
                "no catalog to search"
            );
            return Ok(None);
        }
        Err(error) => return Err(error),
    };

    let alternative = resolve_alternative(target, catalog.products());
    if let Some(found) = &alternative {
        info!(
            event_name = "alternative.resolved",
            product_id = %target.id,
            alternative_id = %found.product.id,
            reason = ?found.reason,
            "alternative product resolved"
        );
    }
    Ok(alternative.map(ResolvedAlternative::from))
}

/// First maximum in iteration order wins ties.
fn highest_scored<'a>(
    candidates: impl Iterator<Item = &'a ProductRecord>,
) -> Option<&'a ProductRecord> {
    candidates.fold(None, |best: Option<&'a ProductRecord>, candidate| match best {
        Some(current) if current.score >= candidate.score => Some(current),
        _ => Some(candidate),
    })
}
