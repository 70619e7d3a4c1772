use serde::Serialize;
use stockwise_core::catalog::{load_catalog, Catalog};
use stockwise_core::config::{AppConfig, LoadOptions};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: LoadOptions, json_output: bool) -> String {
    let report = build_report(options);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });

            match load_catalog(&config.catalog.path) {
                Ok(catalog) => {
                    checks.push(DoctorCheck {
                        name: "catalog_readable",
                        status: CheckStatus::Pass,
                        details: format!(
                            "{} products read from `{}`",
                            catalog.len(),
                            config.catalog.path.display()
                        ),
                    });
                    checks.push(check_stock_status_coverage(&catalog));
                    checks.push(check_price_parsing(&catalog));
                }
                Err(error) => {
                    checks.push(DoctorCheck {
                        name: "catalog_readable",
                        status: CheckStatus::Fail,
                        details: error.to_string(),
                    });
                    checks.push(DoctorCheck::skipped(
                        "stock_status_coverage",
                        "the catalog could not be read",
                    ));
                    checks.push(DoctorCheck::skipped("price_parsing", "the catalog could not be read"));
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["catalog_readable", "stock_status_coverage", "price_parsing"] {
                checks.push(DoctorCheck::skipped(name, "configuration did not load"));
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_stock_status_coverage(catalog: &Catalog) -> DoctorCheck {
    let missing = catalog.products().iter().filter(|product| product.stock_status.is_none()).count();

    if missing == 0 {
        DoctorCheck {
            name: "stock_status_coverage",
            status: CheckStatus::Pass,
            details: format!("all {} products carry a stock status", catalog.len()),
        }
    } else {
        DoctorCheck {
            name: "stock_status_coverage",
            status: CheckStatus::Fail,
            details: format!(
                "{missing} of {} products have no stock status; run `stockwise synthesize`",
                catalog.len()
            ),
        }
    }
}

fn check_price_parsing(catalog: &Catalog) -> DoctorCheck {
    let unparsable = catalog
        .products()
        .iter()
        .filter(|product| product.price.amount().is_err())
        .map(|product| product.id.to_string())
        .collect::<Vec<_>>();

    if unparsable.is_empty() {
        DoctorCheck {
            name: "price_parsing",
            status: CheckStatus::Pass,
            details: "every price parses to an amount".to_string(),
        }
    } else {
        DoctorCheck {
            name: "price_parsing",
            status: CheckStatus::Fail,
            details: format!("unparsable prices for product ids: {}", unparsable.join(", ")),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
