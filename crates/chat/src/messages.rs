use std::path::Path;

use serde::Serialize;
use stockwise_core::alternatives::{
    resolve_alternative, resolve_alternative_in_file, AlternativeReason, ResolvedAlternative,
};
use stockwise_core::config::DisplayConfig;
use stockwise_core::domain::product::{ProductRecord, StockStatus};
use stockwise_core::errors::ApplicationError;

use crate::blocks::{ButtonElement, ButtonStyle, MessageBuilder, MessageTemplate};

pub const EXAMPLE_REQUESTS: [&str; 3] = [
    "Long-lasting, high-quality wireless earbuds",
    "A desk light",
    "A humidifier that charges over USB",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplaySettings {
    pub app_name: String,
    pub image_dir: String,
    pub product_page_url: String,
}

impl From<&DisplayConfig> for DisplaySettings {
    fn from(config: &DisplayConfig) -> Self {
        Self {
            app_name: config.app_name.clone(),
            image_dir: config.image_dir.clone(),
            product_page_url: config.product_page_url.clone(),
        }
    }
}

impl DisplaySettings {
    pub fn image_url(&self, file_name: &str) -> String {
        format!("{}/{}", self.image_dir.trim_end_matches('/'), file_name)
    }
}

pub type SuggestedAlternative = ResolvedAlternative;

/// One assistant answer: the recommended product plus, when it is sold out, a substitute.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub product: ProductRecord,
    pub alternative: Option<SuggestedAlternative>,
}

impl Recommendation {
    /// Looks up a substitute only when the product is out of stock.
    pub fn resolve(product: ProductRecord, catalog: &[ProductRecord]) -> Self {
        let alternative = if product.effective_stock_status() == StockStatus::OutOfStock {
            resolve_alternative(&product, catalog).map(SuggestedAlternative::from)
        } else {
            None
        };
        Self { product, alternative }
    }

    /// Same as [`Recommendation::resolve`], but the catalog at `catalog_path` is only read
    /// when the product is out of stock. A missing catalog yields no alternative.
    pub fn resolve_from_file(
        product: ProductRecord,
        catalog_path: &Path,
    ) -> Result<Self, ApplicationError> {
        if product.effective_stock_status() != StockStatus::OutOfStock {
            return Ok(Self::without_alternative(product));
        }
        let alternative = resolve_alternative_in_file(&product, catalog_path)?;
        Ok(Self { product, alternative })
    }

    pub fn without_alternative(product: ProductRecord) -> Self {
        Self { product, alternative: None }
    }
}

pub fn stock_notice(status: StockStatus) -> Option<&'static str> {
    match status {
        StockStatus::InStock => None,
        StockStatus::LowStock => {
            Some("🟡 Only a few left in stock. We recommend ordering soon.")
        }
        StockStatus::OutOfStock => Some(
            "🔴 Sorry, this product is currently sold out. Would you like to wait for it to be restocked?",
        ),
    }
}

fn rating_line(product: &ProductRecord) -> String {
    format!("{} ({} reviews)", product.score, product.review_number)
}

fn details_text(product: &ProductRecord) -> String {
    format!(
        "*Category:* {}\n*Maker:* {}\n*Rating:* {}",
        product.category,
        product.maker,
        rating_line(product)
    )
}

fn summary_text(product: &ProductRecord) -> String {
    format!("*{}* (product ID: {})\n*Price:* {}", product.name, product.id, product.price)
}

pub fn app_title(settings: &DisplaySettings) -> MessageTemplate {
    MessageBuilder::new(settings.app_name.clone())
        .header("app.title.v1", settings.app_name.clone())
        .build()
}

pub fn welcome_message(settings: &DisplaySettings) -> MessageTemplate {
    let examples = EXAMPLE_REQUESTS
        .iter()
        .map(|example| format!("• \"{example}\""))
        .collect::<Vec<_>>()
        .join("\n");

    MessageBuilder::new(format!("Welcome to {}", settings.app_name))
        .section("assistant.welcome.v1", |section| {
            section.plain(
                "This is a conversational product recommendation assistant. Describe the product \
                 you are looking for in the chat box below and we will recommend one for you.",
            );
        })
        .section("assistant.welcome.examples.v1", |section| {
            section.mrkdwn(format!("*Examples*\n{examples}"));
        })
        .build()
}

pub fn user_message(text: &str) -> MessageTemplate {
    MessageBuilder::new(text.to_owned())
        .section("user.message.v1", |section| {
            section.plain(text);
        })
        .build()
}

pub fn recommendation_message(
    recommendation: &Recommendation,
    settings: &DisplaySettings,
) -> MessageTemplate {
    let product = &recommendation.product;
    let status = product.effective_stock_status();
    let alternative = recommendation
        .alternative
        .as_ref()
        .filter(|_| status == StockStatus::OutOfStock);

    MessageBuilder::new(format!("Recommended: {} ({})", product.name, product.price))
        .section("product.intro.v1", |section| {
            section.plain("Here is the product we recommend.");
        })
        .section("product.summary.v1", |section| {
            section.mrkdwn(summary_text(product));
        })
        .when(stock_notice(status).is_some(), |builder| {
            builder.section("product.stock_notice.v1", |section| {
                section.plain(stock_notice(status).unwrap_or_default());
            })
        })
        .section("product.details.v1", |section| {
            section.mrkdwn(details_text(product));
        })
        .image("product.image.v1", settings.image_url(&product.file_name), product.name.clone())
        .section("product.description.v1", |section| {
            section.plain(product.description.clone());
        })
        .section("product.audience.v1", |section| {
            section.mrkdwn(format!("*Recommended for*\n{}", product.recommended_people));
        })
        .actions("product.link.v1", |actions| {
            actions.button(
                ButtonElement::new("product.open_page.v1", "Open product page")
                    .style(ButtonStyle::Primary)
                    .url(settings.product_page_url.clone())
                    .value(product.id.to_string()),
            );
        })
        .when(alternative.is_some(), |builder| match alternative {
            Some(alternative) => append_alternative(builder, alternative),
            None => builder,
        })
        .build()
}

fn append_alternative(builder: MessageBuilder, alternative: &SuggestedAlternative) -> MessageBuilder {
    let product = &alternative.product;
    let status = product.effective_stock_status();
    let reason = match alternative.reason {
        AlternativeReason::SameCategory => {
            format!("This is the best-rated item available in *{}*.", product.category)
        }
        AlternativeReason::CatalogWide => {
            "Nothing else is available in this category, so here is our best-rated item in stock."
                .to_string()
        }
    };

    builder
        .divider("alternative.divider.v1")
        .header("alternative.header.v1", "You might like this instead")
        .section("alternative.reason.v1", |section| {
            section.mrkdwn(reason);
        })
        .section("alternative.summary.v1", |section| {
            section.mrkdwn(summary_text(product));
        })
        .when(stock_notice(status).is_some(), |builder| {
            builder.section("alternative.stock_notice.v1", |section| {
                section.plain(stock_notice(status).unwrap_or_default());
            })
        })
        .section("alternative.details.v1", |section| {
            section.mrkdwn(details_text(product));
        })
}

pub fn error_message(summary: &str, correlation_id: &str) -> MessageTemplate {
    MessageBuilder::new(summary.to_owned())
        .section("assistant.error.summary.v1", |section| {
            section.mrkdwn(format!(":warning: {summary}"));
        })
        .context("assistant.error.context.v1", |context| {
            context.plain(format!("Correlation ID: {correlation_id}"));
        })
        .build()
}
