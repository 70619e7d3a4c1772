use serde::Serialize;
use stockwise_core::catalog::{load_catalog, save_catalog, Catalog};
use stockwise_core::config::{AppConfig, LoadOptions};
use stockwise_core::domain::product::{ProductId, StockStatus};
use stockwise_core::errors::ApplicationError;
use stockwise_core::stock::{DrawMode, RngDraws, StockDistribution, StockSynthesizer};
use tracing::info;

use crate::commands::CommandResult;

const COMMAND: &str = "synthesize";
const PREVIEW_ROWS: usize = 5;

#[derive(Clone, Debug, Default)]
pub struct SynthesizeArgs {
    pub seed: Option<u64>,
    pub draw_mode: Option<DrawMode>,
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
struct SynthesisReport {
    catalog_path: String,
    record_count: usize,
    draw_mode: DrawMode,
    seed: Option<u64>,
    distribution: StockDistribution,
    preview: Vec<PreviewRow>,
    written: bool,
}

#[derive(Debug, Serialize)]
struct PreviewRow {
    id: ProductId,
    name: String,
    stock_status: StockStatus,
}

pub fn run(mut options: LoadOptions, args: SynthesizeArgs) -> CommandResult {
    if args.seed.is_some() {
        options.overrides.stock_seed = args.seed;
    }
    if args.draw_mode.is_some() {
        options.overrides.stock_draw_mode = args.draw_mode;
    }

    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::from_error(
                COMMAND,
                &ApplicationError::Configuration(error.to_string()),
            )
        }
    };

    match synthesize(&config, args.dry_run) {
        Ok(report) => {
            let message = if report.written {
                format!("stock statuses written for {} products", report.record_count)
            } else {
                format!("dry run: stock statuses drawn for {} products", report.record_count)
            };
            CommandResult::success(COMMAND, message, report)
        }
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}

fn synthesize(config: &AppConfig, dry_run: bool) -> Result<SynthesisReport, ApplicationError> {
    let path = &config.catalog.path;
    let mut catalog = load_catalog(path)?;
    let mode = config.stock.draw_mode;

    let statuses = match config.stock.seed {
        Some(seed) => StockSynthesizer::new(RngDraws::seeded(seed), mode).synthesize(catalog.products()),
        None => StockSynthesizer::new(RngDraws::from_entropy(), mode).synthesize(catalog.products()),
    }?;
    catalog.apply_stock_statuses(&statuses)?;

    let distribution = StockDistribution::from_statuses(&statuses);
    info!(
        event_name = "stock.synthesis.completed",
        catalog_path = %path.display(),
        draw_mode = %mode,
        in_stock = distribution.in_stock,
        low_stock = distribution.low_stock,
        out_of_stock = distribution.out_of_stock,
        "stock statuses synthesized"
    );

    if !dry_run {
        save_catalog(&catalog, path)?;
    }

    Ok(SynthesisReport {
        catalog_path: path.display().to_string(),
        record_count: catalog.len(),
        draw_mode: mode,
        seed: config.stock.seed,
        distribution,
        preview: preview(&catalog),
        written: !dry_run,
    })
}

fn preview(catalog: &Catalog) -> Vec<PreviewRow> {
    catalog
        .products()
        .iter()
        .take(PREVIEW_ROWS)
        .map(|product| PreviewRow {
            id: product.id,
            name: product.name.clone(),
            stock_status: product.effective_stock_status(),
        })
        .collect()
}
