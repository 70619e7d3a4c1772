use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use stockwise_cli::commands::recommend::{RecommendArgs, RecommendSource};
use stockwise_cli::commands::synthesize::SynthesizeArgs;
use stockwise_cli::commands::{alternative, config, doctor, recommend, synthesize};
use stockwise_core::catalog::load_catalog;
use stockwise_core::config::{ConfigOverrides, LoadOptions};
use stockwise_core::domain::product::{ProductId, StockStatus};
use stockwise_core::stock::DrawMode;
use tempfile::TempDir;

const STOCKED_CATALOG: &str = "\
id,name,category,maker,price,score,review_number,file_name,description,recommended_people,stock_status
1,Wireless Earbuds Pro,audio,SoundCo,\"12,800円\",4.6,320,earbuds.jpg,Noise cancelling,Commuters,out_of_stock
2,Bookshelf Speaker,audio,SoundCo,\"9,800円\",4.8,100,speaker.jpg,Warm sound,Music lovers,in_stock
3,Studio Headphones,audio,Monitorix,\"5,000円\",4.2,50,headphones.jpg,Flat response,Producers,low_stock
4,Desk Light,lighting,Lumen,\"3,980円\",4.1,85,light.jpg,Dimmable LED,Students,in_stock
";

const UNSTOCKED_CATALOG: &str = "\
id,name,category,maker,price,score,review_number,file_name,description,recommended_people
1,Wireless Earbuds Pro,audio,SoundCo,\"12,800円\",4.6,320,earbuds.jpg,Noise cancelling,Commuters
2,Bookshelf Speaker,audio,SoundCo,\"9,800円\",4.8,100,speaker.jpg,Warm sound,Music lovers
3,Desk Light,lighting,Lumen,\"3,980円\",4.1,85,light.jpg,Dimmable LED,Students
4,USB Humidifier,appliance,Mistly,2980,3.9,410,humidifier.jpg,Quiet mist,Office workers
5,Gaming Mouse,peripherals,Clickr,\"6,500円\",4.7,300,mouse.jpg,Light shell,Gamers
6,Mechanical Keyboard,peripherals,Clickr,\"14,000円\",4.4,90,keyboard.jpg,Hot swap,Typists
";

const RECORD: &str = "\
name: Wireless Earbuds Pro
id: 1
price: 12,800円
category: audio
maker: SoundCo
score: 4.6
review_number: 320
file_name: earbuds.jpg
description: Noise cancelling
recommended_people: Commuters
stock_status: out_of_stock
";

#[test]
fn synthesize_writes_a_status_for_every_product() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let catalog_path = write_catalog(&dir, UNSTOCKED_CATALOG);

        let result = synthesize::run(
            options_for(&dir, &catalog_path),
            SynthesizeArgs { seed: Some(42), ..SynthesizeArgs::default() },
        );
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "synthesize");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["details"]["record_count"], 6);
        assert_eq!(payload["details"]["written"], true);
        assert_eq!(payload["details"]["preview"].as_array().map(Vec::len), Some(5));

        let distribution = &payload["details"]["distribution"];
        let total = ["in_stock", "low_stock", "out_of_stock"]
            .iter()
            .map(|key| distribution[*key].as_u64().unwrap_or_default())
            .sum::<u64>();
        assert_eq!(total, 6);

        let catalog = load_catalog(&catalog_path).expect("catalog reloads");
        assert_eq!(catalog.len(), 6);
        assert!(catalog.products().iter().all(|product| product.stock_status.is_some()));
        assert_eq!(catalog.find(ProductId(4)).map(|product| product.review_number), Some(410));
    });
}

#[test]
fn synthesize_dry_run_is_reproducible_and_leaves_catalog_untouched() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let catalog_path = write_catalog(&dir, UNSTOCKED_CATALOG);

        let args = SynthesizeArgs {
            seed: Some(7),
            draw_mode: Some(DrawMode::Cumulative),
            dry_run: true,
        };
        let first = parse_payload(&synthesize::run(options_for(&dir, &catalog_path), args.clone()).output);
        let second = parse_payload(&synthesize::run(options_for(&dir, &catalog_path), args).output);

        assert_eq!(first["details"]["written"], false);
        assert_eq!(first["details"]["draw_mode"], "cumulative");
        assert_eq!(first["details"]["seed"], 7);
        assert_eq!(first["details"]["distribution"], second["details"]["distribution"]);
        assert_eq!(first["details"]["preview"], second["details"]["preview"]);

        let on_disk = fs::read_to_string(&catalog_path).expect("catalog readable");
        assert_eq!(on_disk, UNSTOCKED_CATALOG);
    });
}

#[test]
fn synthesize_reports_missing_catalog() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let result = synthesize::run(
            options_for(&dir, &dir.path().join("missing.csv")),
            SynthesizeArgs::default(),
        );

        assert_eq!(result.exit_code, 3);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "catalog_not_found");
    });
}

#[test]
fn synthesize_rejects_unparsable_price_without_writing() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let broken = UNSTOCKED_CATALOG.replace("2980", "ask in store");
        let catalog_path = write_catalog(&dir, &broken);

        let result = synthesize::run(
            options_for(&dir, &catalog_path),
            SynthesizeArgs { seed: Some(1), ..SynthesizeArgs::default() },
        );

        assert_eq!(result.exit_code, 4);
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_price");
        assert_eq!(fs::read_to_string(&catalog_path).expect("catalog readable"), broken);
    });
}

#[test]
fn synthesize_returns_config_failure_for_invalid_env() {
    with_env(&[("STOCKWISE_DISPLAY_PRODUCT_PAGE_URL", "ftp://shop.example")], || {
        let dir = TempDir::new().expect("tempdir");
        let catalog_path = write_catalog(&dir, UNSTOCKED_CATALOG);

        let result = synthesize::run(options_for(&dir, &catalog_path), SynthesizeArgs::default());

        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "config_validation");
    });
}

#[test]
fn alternative_prefers_same_category() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let catalog_path = write_catalog(&dir, STOCKED_CATALOG);

        let result = alternative::run(options_for(&dir, &catalog_path), 1);
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let details = &parse_payload(&result.output)["details"];
        assert_eq!(details["stock_status"], "out_of_stock");
        assert_eq!(details["reason"], "same_category");
        assert_eq!(details["alternative"]["id"], 2);
        assert_eq!(details["alternative"]["name"], "Bookshelf Speaker");
    });
}

#[test]
fn alternative_reports_unknown_product() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let catalog_path = write_catalog(&dir, STOCKED_CATALOG);

        let result = alternative::run(options_for(&dir, &catalog_path), 99);

        assert_eq!(result.exit_code, 3);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "alternative");
        assert_eq!(payload["error_class"], "product_not_found");
    });
}

#[test]
fn recommend_by_id_includes_alternative_blocks() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let catalog_path = write_catalog(&dir, STOCKED_CATALOG);

        let result = recommend::run(
            options_for(&dir, &catalog_path),
            RecommendArgs { source: RecommendSource::Id(1), request: None, json: true },
        );
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let transcript: Value = serde_json::from_str(&result.output).expect("valid json");
        let turns = transcript["turns"].as_array().expect("turns array");
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0]["role"], "assistant");

        let ids = block_ids(&turns[0]["message"]);
        assert!(ids.contains(&"product.stock_notice.v1".to_string()));
        assert!(ids.contains(&"alternative.header.v1".to_string()));
        assert_eq!(transcript["title"]["blocks"][0]["type"], "header");
    });
}

#[test]
fn recommend_record_without_catalog_skips_alternative() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let record_path = dir.path().join("record.txt");
        fs::write(&record_path, RECORD).expect("record written");

        let result = recommend::run(
            options_for(&dir, &dir.path().join("missing.csv")),
            RecommendArgs {
                source: RecommendSource::RecordFile(record_path),
                request: Some("Long-lasting wireless earbuds".to_string()),
                json: false,
            },
        );
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        assert!(result.output.starts_with("## Product Recommendation Assistant"));
        assert!(result.output.contains("[user]\nLong-lasting wireless earbuds"));
        assert!(result.output.contains("Wireless Earbuds Pro"));
        assert!(result.output.contains("sold out"));
        assert!(!result.output.contains("You might like this instead"));
    });
}

#[test]
fn recommend_in_stock_record_does_not_read_catalog() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let duplicated = format!(
            "{STOCKED_CATALOG}4,Desk Light,lighting,Lumen,\"3,980円\",4.1,85,light.jpg,Dimmable LED,Students,in_stock\n"
        );
        let catalog_path = write_catalog(&dir, &duplicated);
        let record_path = dir.path().join("record.txt");
        fs::write(&record_path, RECORD.replace("stock_status: out_of_stock", "stock_status: in_stock"))
            .expect("record written");

        let result = recommend::run(
            options_for(&dir, &catalog_path),
            RecommendArgs {
                source: RecommendSource::RecordFile(record_path),
                request: None,
                json: false,
            },
        );

        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);
        assert!(result.output.contains("Wireless Earbuds Pro"));
        assert!(!result.output.contains("You might like this instead"));
    });
}

#[test]
fn recommend_sold_out_record_surfaces_catalog_errors() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let duplicated = format!(
            "{STOCKED_CATALOG}4,Desk Light,lighting,Lumen,\"3,980円\",4.1,85,light.jpg,Dimmable LED,Students,in_stock\n"
        );
        let catalog_path = write_catalog(&dir, &duplicated);
        let record_path = dir.path().join("record.txt");
        fs::write(&record_path, RECORD).expect("record written");

        let result = recommend::run(
            options_for(&dir, &catalog_path),
            RecommendArgs {
                source: RecommendSource::RecordFile(record_path),
                request: None,
                json: true,
            },
        );

        assert_eq!(result.exit_code, 3);
        assert_eq!(parse_payload(&result.output)["error_class"], "duplicate_product_id");
    });
}

#[test]
fn recommend_sold_out_record_uses_catalog_alternative() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let catalog_path = write_catalog(&dir, STOCKED_CATALOG);
        let record_path = dir.path().join("record.txt");
        fs::write(&record_path, RECORD).expect("record written");

        let result = recommend::run(
            options_for(&dir, &catalog_path),
            RecommendArgs {
                source: RecommendSource::RecordFile(record_path),
                request: None,
                json: false,
            },
        );

        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);
        assert!(result.output.contains("You might like this instead"));
        assert!(result.output.contains("Bookshelf Speaker"));
    });
}

#[test]
fn recommend_renders_error_card_for_bad_record() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let record_path = dir.path().join("record.txt");
        fs::write(&record_path, RECORD.replace("maker: SoundCo\n", "")).expect("record written");

        let result = recommend::run(
            options_for(&dir, &dir.path().join("missing.csv")),
            RecommendArgs {
                source: RecommendSource::RecordFile(record_path),
                request: None,
                json: false,
            },
        );

        assert_eq!(result.exit_code, 4);
        assert!(result.output.contains("missing required field `maker`"));
        assert!(result.output.contains("Correlation ID: recommend.invalid_recommendation"));
    });
}

#[test]
fn config_attributes_values_to_their_source() {
    with_env(&[("STOCKWISE_STOCK_SEED", "9")], || {
        let dir = TempDir::new().expect("tempdir");
        let config_path = dir.path().join("stockwise.toml");
        fs::write(&config_path, "[display]\napp_name = \"Gadget Guide\"\n").expect("config written");

        let options = LoadOptions {
            config_path: Some(config_path.clone()),
            require_file: true,
            overrides: ConfigOverrides {
                catalog_path: Some(dir.path().join("products.csv")),
                ..ConfigOverrides::default()
            },
        };
        let output = config::run(options);

        assert!(output.contains("- stock.seed = 9 (source: env (STOCKWISE_STOCK_SEED))"));
        assert!(output.contains(&format!(
            "- display.app_name = Gadget Guide (source: file ({}))",
            config_path.display()
        )));
        assert!(output.contains("(source: cli)"));
        assert!(output.contains("- stock.draw_mode = two_draw (source: default)"));
    });
}

#[test]
fn doctor_flags_catalog_without_stock_statuses() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let catalog_path = write_catalog(&dir, UNSTOCKED_CATALOG);

        let report = parse_payload(&doctor::run(options_for(&dir, &catalog_path), true));
        assert_eq!(report["overall_status"], "fail");

        let status_of = |name: &str| {
            report["checks"]
                .as_array()
                .and_then(|checks| checks.iter().find(|check| check["name"] == name))
                .map(|check| check["status"].clone())
        };
        assert_eq!(status_of("config_validation"), Some(Value::from("pass")));
        assert_eq!(status_of("catalog_readable"), Some(Value::from("pass")));
        assert_eq!(status_of("stock_status_coverage"), Some(Value::from("fail")));
        assert_eq!(status_of("price_parsing"), Some(Value::from("pass")));
    });
}

#[test]
fn doctor_passes_after_synthesis() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let catalog_path = write_catalog(&dir, UNSTOCKED_CATALOG);
        let result = synthesize::run(
            options_for(&dir, &catalog_path),
            SynthesizeArgs { seed: Some(3), ..SynthesizeArgs::default() },
        );
        assert_eq!(result.exit_code, 0);

        let output = doctor::run(options_for(&dir, &catalog_path), false);
        assert!(output.starts_with("doctor: all readiness checks passed"), "{output}");
        assert!(output.contains("- [ok] stock_status_coverage: all 6 products carry a stock status"));

        let catalog = load_catalog(&catalog_path).expect("catalog reloads");
        let statuses = catalog.products().iter().filter_map(|product| product.stock_status);
        assert!(statuses.into_iter().all(|status| StockStatus::ALL.contains(&status)));
    });
}

fn options_for(dir: &TempDir, catalog_path: &Path) -> LoadOptions {
    LoadOptions {
        config_path: Some(dir.path().join("absent.toml")),
        require_file: false,
        overrides: ConfigOverrides {
            catalog_path: Some(catalog_path.to_path_buf()),
            ..ConfigOverrides::default()
        },
    }
}

fn write_catalog(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("products.csv");
    fs::write(&path, contents).expect("catalog written");
    path
}

fn block_ids(message: &Value) -> Vec<String> {
    message["blocks"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|block| block["block_id"].as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid json")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "STOCKWISE_CATALOG_PATH",
        "STOCKWISE_STOCK_SEED",
        "STOCKWISE_STOCK_DRAW_MODE",
        "STOCKWISE_DISPLAY_APP_NAME",
        "STOCKWISE_DISPLAY_IMAGE_DIR",
        "STOCKWISE_DISPLAY_PRODUCT_PAGE_URL",
        "STOCKWISE_LOGGING_LEVEL",
        "STOCKWISE_LOGGING_FORMAT",
        "STOCKWISE_LOG_LEVEL",
        "STOCKWISE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
