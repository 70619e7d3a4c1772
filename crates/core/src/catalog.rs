use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use crate::domain::product::{ProductId, ProductRecord, StockStatus};
use crate::errors::{ApplicationError, DomainError};

/// Column order used when the catalog is written back.
pub const CATALOG_COLUMNS: [&str; 11] = [
    "id",
    "name",
    "category",
    "maker",
    "price",
    "score",
    "review_number",
    "file_name",
    "description",
    "recommended_people",
    "stock_status",
];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<ProductRecord>,
}

impl Catalog {
    pub fn new(products: Vec<ProductRecord>) -> Result<Self, DomainError> {
        let mut seen = HashSet::with_capacity(products.len());
        for product in &products {
            if !seen.insert(product.id) {
                return Err(DomainError::DuplicateProductId(product.id));
            }
        }
        Ok(Self { products })
    }

    pub fn find(&self, product_id: ProductId) -> Option<&ProductRecord> {
        self.products.iter().find(|product| product.id == product_id)
    }

    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Attaches one synthesized status per row, in catalog order.
    pub fn apply_stock_statuses(&mut self, statuses: &[StockStatus]) -> Result<(), DomainError> {
        if statuses.len() != self.products.len() {
            return Err(DomainError::InvariantViolation(format!(
                "expected {} stock statuses, got {}",
                self.products.len(),
                statuses.len()
            )));
        }

        for (product, status) in self.products.iter_mut().zip(statuses) {
            product.stock_status = Some(*status);
        }
        Ok(())
    }
}

pub fn load_catalog(path: &Path) -> Result<Catalog, ApplicationError> {
    let file = File::open(path).map_err(|error| match error.kind() {
        io::ErrorKind::NotFound => ApplicationError::CatalogNotFound(path.to_path_buf()),
        _ => ApplicationError::Persistence(format!(
            "could not open catalog `{}`: {error}",
            path.display()
        )),
    })?;

    let catalog = read_catalog(file, path)?;
    info!(
        event_name = "catalog.loaded",
        path = %path.display(),
        product_count = catalog.len(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// Parses CSV from any reader; `origin` only labels errors.
pub fn read_catalog<R: Read>(reader: R, origin: &Path) -> Result<Catalog, ApplicationError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
    let mut products = Vec::new();

    for row in reader.deserialize::<ProductRecord>() {
        products.push(row.map_err(|error| csv_error(origin, error))?);
    }

    Ok(Catalog::new(products)?)
}

/// Replaces the catalog file in one step: rows go to a temporary sibling that is renamed
/// over `path`, so an interrupted run leaves the previous file untouched. An existing
/// file keeps its permissions.
///
/// Only the columns in [`CATALOG_COLUMNS`] are written; any other column in a hand-edited
/// catalog is dropped.
pub fn save_catalog(catalog: &Catalog, path: &Path) -> Result<(), ApplicationError> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut staged = NamedTempFile::new_in(&directory).map_err(|error| {
        ApplicationError::Persistence(format!(
            "could not stage catalog in `{}`: {error}",
            directory.display()
        ))
    })?;

    write_catalog(catalog, staged.as_file_mut(), path)?;

    if let Ok(existing) = fs::metadata(path) {
        staged.as_file().set_permissions(existing.permissions()).map_err(|error| {
            ApplicationError::Persistence(format!(
                "could not carry permissions of `{}` over: {error}",
                path.display()
            ))
        })?;
    }

    staged.persist(path).map_err(|error| {
        ApplicationError::Persistence(format!(
            "could not replace catalog `{}`: {}",
            path.display(),
            error.error
        ))
    })?;

    info!(
        event_name = "catalog.saved",
        path = %path.display(),
        product_count = catalog.len(),
        "catalog written"
    );
    Ok(())
}

pub fn write_catalog<W: Write>(
    catalog: &Catalog,
    writer: W,
    origin: &Path,
) -> Result<(), ApplicationError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);

    writer.write_record(CATALOG_COLUMNS).map_err(|error| csv_error(origin, error))?;
    for product in catalog.products() {
        writer.serialize(product).map_err(|error| csv_error(origin, error))?;
    }
    writer.flush().map_err(|error| {
        ApplicationError::Persistence(format!("could not flush `{}`: {error}", origin.display()))
    })
}

fn csv_error(origin: &Path, error: csv::Error) -> ApplicationError {
    if error.is_io_error() {
        return ApplicationError::Persistence(format!("`{}`: {error}", origin.display()));
    }
    ApplicationError::MalformedRecord { path: origin.to_path_buf(), message: error.to_string() }
}
