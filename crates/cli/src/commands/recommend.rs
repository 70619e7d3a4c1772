use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use stockwise_chat::blocks::MessageTemplate;
use stockwise_chat::conversation::{ConversationLog, RenderedTurn};
use stockwise_chat::messages::{
    app_title, error_message, welcome_message, DisplaySettings, Recommendation,
};
use stockwise_chat::record::parse_recommendation;
use stockwise_core::catalog::load_catalog;
use stockwise_core::config::{AppConfig, LoadOptions};
use stockwise_core::domain::product::ProductId;
use stockwise_core::errors::ApplicationError;

use crate::commands::{
    exit_code_for, CommandResult, CATALOG_EXIT_CODE, CONFIG_EXIT_CODE, DOMAIN_EXIT_CODE,
};

const COMMAND: &str = "recommend";

#[derive(Clone, Debug)]
pub enum RecommendSource {
    /// A product already in the catalog.
    Id(u64),
    /// A `key: value` recommendation record, as handed back by the recommender.
    RecordFile(PathBuf),
}

#[derive(Clone, Debug)]
pub struct RecommendArgs {
    pub source: RecommendSource,
    pub request: Option<String>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Transcript {
    title: MessageTemplate,
    welcome: MessageTemplate,
    turns: Vec<RenderedTurn>,
}

struct RecommendFailure {
    error_class: String,
    message: String,
    exit_code: u8,
}

impl From<ApplicationError> for RecommendFailure {
    fn from(error: ApplicationError) -> Self {
        Self {
            error_class: error.error_class().to_string(),
            message: error.to_string(),
            exit_code: exit_code_for(&error),
        }
    }
}

pub fn run(options: LoadOptions, args: RecommendArgs) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            let failure = RecommendFailure {
                error_class: "config_validation".to_string(),
                message: error.to_string(),
                exit_code: CONFIG_EXIT_CODE,
            };
            return render_failure(&failure, args.json);
        }
    };
    let settings = DisplaySettings::from(&config.display);

    let recommendation = match recommend(&config, &args.source) {
        Ok(recommendation) => recommendation,
        Err(failure) => return render_failure(&failure, args.json),
    };

    let mut log = ConversationLog::new();
    if let Some(request) = &args.request {
        log.push_user(request.as_str());
    }
    log.push_recommendation(recommendation);

    let transcript = Transcript {
        title: app_title(&settings),
        welcome: welcome_message(&settings),
        turns: log.render(&settings),
    };

    let output = if args.json {
        match serde_json::to_string_pretty(&transcript) {
            Ok(output) => output,
            Err(error) => {
                return CommandResult::failure(COMMAND, "serialization", error.to_string(), 1)
            }
        }
    } else {
        render_plain(&transcript)
    };
    CommandResult { exit_code: 0, output }
}

fn recommend(
    config: &AppConfig,
    source: &RecommendSource,
) -> Result<Recommendation, RecommendFailure> {
    match source {
        RecommendSource::Id(product_id) => {
            let catalog = load_catalog(&config.catalog.path)?;
            let product_id = ProductId(*product_id);
            let product = catalog.find(product_id).cloned().ok_or_else(|| RecommendFailure {
                error_class: "product_not_found".to_string(),
                message: format!("product {product_id} is not in the catalog"),
                exit_code: CATALOG_EXIT_CODE,
            })?;
            Ok(Recommendation::resolve(product, catalog.products()))
        }
        RecommendSource::RecordFile(path) => {
            let text = fs::read_to_string(path).map_err(|error| RecommendFailure {
                error_class: "record_unreadable".to_string(),
                message: format!("could not read `{}`: {error}", path.display()),
                exit_code: CATALOG_EXIT_CODE,
            })?;
            let product = parse_recommendation(&text).map_err(|error| RecommendFailure {
                error_class: "invalid_recommendation".to_string(),
                message: error.to_string(),
                exit_code: DOMAIN_EXIT_CODE,
            })?;

            Ok(Recommendation::resolve_from_file(product, &config.catalog.path)?)
        }
    }
}

fn render_plain(transcript: &Transcript) -> String {
    let mut sections = vec![transcript.title.to_plain_text(), transcript.welcome.to_plain_text()];
    for turn in &transcript.turns {
        sections.push(format!("[{}]\n{}", turn.role.as_str(), turn.message.to_plain_text()));
    }
    sections.join("\n\n")
}

fn render_failure(failure: &RecommendFailure, json: bool) -> CommandResult {
    if json {
        return CommandResult::failure(
            COMMAND,
            &failure.error_class,
            failure.message.clone(),
            failure.exit_code,
        );
    }

    let correlation_id = format!("{COMMAND}.{}", failure.error_class);
    CommandResult {
        exit_code: failure.exit_code,
        output: error_message(&failure.message, &correlation_id).to_plain_text(),
    }
}
