pub mod alternative;
pub mod config;
pub mod doctor;
pub mod recommend;
pub mod synthesize;

use serde::Serialize;
use serde_json::Value;
use stockwise_core::errors::{ApplicationError, DomainError};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>, details: impl Serialize) -> Self {
        let details = serde_json::to_value(details).ok().filter(|value| !value.is_null());
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            details,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            details: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_error(command: &str, error: &ApplicationError) -> Self {
        Self::failure(command, error.error_class(), error.to_string(), exit_code_for(error))
    }
}

pub const CONFIG_EXIT_CODE: u8 = 2;
pub const CATALOG_EXIT_CODE: u8 = 3;
pub const DOMAIN_EXIT_CODE: u8 = 4;
pub const PERSISTENCE_EXIT_CODE: u8 = 5;

pub fn exit_code_for(error: &ApplicationError) -> u8 {
    match error {
        ApplicationError::Configuration(_) => CONFIG_EXIT_CODE,
        ApplicationError::CatalogNotFound(_) | ApplicationError::MalformedRecord { .. } => {
            CATALOG_EXIT_CODE
        }
        ApplicationError::Domain(DomainError::DuplicateProductId(_)) => CATALOG_EXIT_CODE,
        ApplicationError::Domain(_) => DOMAIN_EXIT_CODE,
        ApplicationError::Persistence(_) => PERSISTENCE_EXIT_CODE,
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
