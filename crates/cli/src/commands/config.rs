use std::env;
use std::fs;
use std::path::Path;

use stockwise_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

struct ConfigField<'a> {
    key_path: &'static str,
    value: String,
    env_keys: &'a [&'static str],
    cli_override: bool,
}

pub fn run(options: LoadOptions) -> String {
    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let overrides = options.overrides.clone();

    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields = [
        ConfigField {
            key_path: "catalog.path",
            value: config.catalog.path.display().to_string(),
            env_keys: &["STOCKWISE_CATALOG_PATH"],
            cli_override: overrides.catalog_path.is_some(),
        },
        ConfigField {
            key_path: "stock.seed",
            value: config.stock.seed.map_or_else(|| "<unset>".to_string(), |seed| seed.to_string()),
            env_keys: &["STOCKWISE_STOCK_SEED"],
            cli_override: overrides.stock_seed.is_some(),
        },
        ConfigField {
            key_path: "stock.draw_mode",
            value: config.stock.draw_mode.to_string(),
            env_keys: &["STOCKWISE_STOCK_DRAW_MODE"],
            cli_override: overrides.stock_draw_mode.is_some(),
        },
        ConfigField {
            key_path: "display.app_name",
            value: config.display.app_name.clone(),
            env_keys: &["STOCKWISE_DISPLAY_APP_NAME"],
            cli_override: false,
        },
        ConfigField {
            key_path: "display.image_dir",
            value: config.display.image_dir.clone(),
            env_keys: &["STOCKWISE_DISPLAY_IMAGE_DIR"],
            cli_override: false,
        },
        ConfigField {
            key_path: "display.product_page_url",
            value: config.display.product_page_url.clone(),
            env_keys: &["STOCKWISE_DISPLAY_PRODUCT_PAGE_URL"],
            cli_override: false,
        },
        ConfigField {
            key_path: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["STOCKWISE_LOGGING_LEVEL", "STOCKWISE_LOG_LEVEL"],
            cli_override: overrides.log_level.is_some(),
        },
        ConfigField {
            key_path: "logging.format",
            value: format!("{:?}", config.logging.format).to_ascii_lowercase(),
            env_keys: &["STOCKWISE_LOGGING_FORMAT", "STOCKWISE_LOG_FORMAT"],
            cli_override: false,
        },
    ];

    let mut lines =
        vec!["effective config (source precedence: cli > env > file > default):".to_string()];
    for field in &fields {
        let source = field_source(field, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(field.key_path, &field.value, source));
    }

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    field: &ConfigField<'_>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if field.cli_override {
        return "cli".to_string();
    }

    if let Some(env_key) = field.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, field.key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
