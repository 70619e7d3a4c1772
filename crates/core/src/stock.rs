//! Stock-status synthesis for a product catalog.
//!
//! Every product is placed in a [`Tier`] from its popularity (`score * review_number`) and
//! its price, then a label is drawn from that tier's odds. Tier selection is deterministic;
//! only the label inside the tier is random, and the randomness comes from a [`DrawSource`]
//! so callers can seed it or script it.

use std::fmt;
use std::str::FromStr;

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::product::{ProductId, ProductRecord, StockStatus};
use crate::errors::DomainError;

pub const POPULARITY_THRESHOLD: Decimal = Decimal::from_parts(1200, 0, 0, false, 0);
pub const PREMIUM_PRICE_THRESHOLD: u64 = 8000;

pub fn popularity(score: Decimal, review_number: u32) -> Decimal {
    score * Decimal::from(review_number)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Popular,
    Premium,
    Standard,
}

/// Cumulative thresholds for one tier: a draw below `first_below` yields `first`, a draw
/// below `second_below` yields `second`, anything else yields `rest`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TierOdds {
    pub first: StockStatus,
    pub first_below: f64,
    pub second: StockStatus,
    pub second_below: f64,
    pub rest: StockStatus,
}

impl Tier {
    /// Popularity wins over price: a popular premium product is still `Popular`.
    pub fn select(popularity: Decimal, price_amount: u64) -> Self {
        if popularity > POPULARITY_THRESHOLD {
            Self::Popular
        } else if price_amount > PREMIUM_PRICE_THRESHOLD {
            Self::Premium
        } else {
            Self::Standard
        }
    }

    pub fn odds(self) -> TierOdds {
        match self {
            Self::Popular => TierOdds {
                first: StockStatus::LowStock,
                first_below: 0.6,
                second: StockStatus::InStock,
                second_below: 0.8,
                rest: StockStatus::OutOfStock,
            },
            Self::Premium => TierOdds {
                first: StockStatus::InStock,
                first_below: 0.7,
                second: StockStatus::LowStock,
                second_below: 0.9,
                rest: StockStatus::OutOfStock,
            },
            Self::Standard => TierOdds {
                first: StockStatus::InStock,
                first_below: 0.5,
                second: StockStatus::LowStock,
                second_below: 0.8,
                rest: StockStatus::OutOfStock,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Popular => "popular",
            Self::Premium => "premium",
            Self::Standard => "standard",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the label inside a tier is drawn.
///
/// `TwoDraw` tests the second threshold against a fresh draw, which skews the effective
/// odds away from the nominal split (popular tier: 0.60 / 0.32 / 0.08 instead of
/// 0.60 / 0.20 / 0.20). `Cumulative` maps a single draw through the thresholds and hits
/// the nominal split exactly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    #[default]
    TwoDraw,
    Cumulative,
}

impl DrawMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TwoDraw => "two_draw",
            Self::Cumulative => "cumulative",
        }
    }
}

impl fmt::Display for DrawMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrawMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "two_draw" | "two-draw" => Ok(Self::TwoDraw),
            "cumulative" => Ok(Self::Cumulative),
            other => Err(format!("unsupported draw mode `{other}` (expected two_draw|cumulative)")),
        }
    }
}

/// Uniform samples in `[0, 1)`.
pub trait DrawSource {
    fn next_unit(&mut self) -> f64;
}

pub struct RngDraws<R> {
    rng: R,
}

impl<R: Rng> RngDraws<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngDraws<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl RngDraws<ThreadRng> {
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl<R: Rng> DrawSource for RngDraws<R> {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StockAssessment {
    pub product_id: ProductId,
    pub popularity: Decimal,
    pub price_amount: u64,
    pub tier: Tier,
    pub status: StockStatus,
}

pub struct StockSynthesizer<D> {
    draws: D,
    mode: DrawMode,
}

impl<D: DrawSource> StockSynthesizer<D> {
    pub fn new(draws: D, mode: DrawMode) -> Self {
        Self { draws, mode }
    }

    /// One status per record, in record order. A single bad price aborts the whole batch.
    pub fn synthesize(&mut self, catalog: &[ProductRecord]) -> Result<Vec<StockStatus>, DomainError> {
        catalog.iter().map(|product| self.assess(product).map(|assessment| assessment.status)).collect()
    }

    pub fn assess(&mut self, product: &ProductRecord) -> Result<StockAssessment, DomainError> {
        let popularity = popularity(product.score, product.review_number);
        let price_amount = product.price.amount().map_err(|error| DomainError::InvalidPrice {
            product_id: product.id,
            raw: error.raw,
        })?;

        let tier = Tier::select(popularity, price_amount);
        let status = self.draw(tier.odds());

        info!(
            event_name = "stock.synthesis.record",
            product_id = %product.id,
            product_name = %product.name,
            tier = %tier,
            stock_status = %status,
            "stock status assigned"
        );

        Ok(StockAssessment { product_id: product.id, popularity, price_amount, tier, status })
    }

    fn draw(&mut self, odds: TierOdds) -> StockStatus {
        let first_draw = self.draws.next_unit();
        if first_draw < odds.first_below {
            return odds.first;
        }

        let second_draw = match self.mode {
            DrawMode::TwoDraw => self.draws.next_unit(),
            DrawMode::Cumulative => first_draw,
        };
        if second_draw < odds.second_below {
            odds.second
        } else {
            odds.rest
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StockDistribution {
    pub in_stock: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
}

impl StockDistribution {
    pub fn from_statuses<'a>(statuses: impl IntoIterator<Item = &'a StockStatus>) -> Self {
        let mut distribution = Self::default();
        for status in statuses {
            match status {
                StockStatus::InStock => distribution.in_stock += 1,
                StockStatus::LowStock => distribution.low_stock += 1,
                StockStatus::OutOfStock => distribution.out_of_stock += 1,
            }
        }
        distribution
    }

    pub fn count(&self, status: StockStatus) -> usize {
        match status {
            StockStatus::InStock => self.in_stock,
            StockStatus::LowStock => self.low_stock,
            StockStatus::OutOfStock => self.out_of_stock,
        }
    }

    pub fn total(&self) -> usize {
        self.in_stock + self.low_stock + self.out_of_stock
    }
}

impl fmt::Display for StockDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = StockStatus::ALL
            .iter()
            .map(|status| format!("{status}: {}", self.count(*status)))
            .collect::<Vec<_>>();
        f.write_str(&parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use rust_decimal::Decimal;

    use super::{
        popularity, DrawMode, DrawSource, RngDraws, StockDistribution, StockSynthesizer, Tier,
    };
    use crate::domain::product::{Price, ProductId, ProductRecord, StockStatus};
    use crate::errors::DomainError;

    struct ScriptedDraws {
        values: VecDeque<f64>,
    }

    impl ScriptedDraws {
        fn new(values: &[f64]) -> Self {
            Self { values: values.iter().copied().collect() }
        }

        fn remaining(&self) -> usize {
            self.values.len()
        }
    }

    impl DrawSource for ScriptedDraws {
        fn next_unit(&mut self) -> f64 {
            self.values.pop_front().expect("scripted draws exhausted")
        }
    }

    fn product(id: u64, score: Decimal, review_number: u32, price: &str) -> ProductRecord {
        ProductRecord {
            id: ProductId(id),
            name: format!("Product {id}"),
            category: "general".to_string(),
            maker: "Maker".to_string(),
            price: Price::new(price),
            score,
            review_number,
            file_name: format!("{id}.jpg"),
            description: "description".to_string(),
            recommended_people: "everyone".to_string(),
            stock_status: None,
        }
    }

    fn popular() -> ProductRecord {
        product(1, Decimal::new(45, 1), 400, "5,000円")
    }

    fn premium() -> ProductRecord {
        product(2, Decimal::new(40, 1), 10, "12,800円")
    }

    fn standard() -> ProductRecord {
        product(3, Decimal::new(35, 1), 20, "1,980円")
    }

    #[test]
    fn popularity_is_score_times_reviews() {
        assert_eq!(popularity(Decimal::new(45, 1), 300), Decimal::new(1350, 0));
        assert_eq!(popularity(Decimal::new(43, 1), 0), Decimal::ZERO);
        assert_eq!(popularity(Decimal::new(37, 1), 7), Decimal::new(259, 1));
    }

    #[test]
    fn tier_selection_is_deterministic_and_ordered() {
        assert_eq!(Tier::select(Decimal::new(1500, 0), 5_000), Tier::Popular);
        assert_eq!(Tier::select(Decimal::new(1500, 0), 50_000), Tier::Popular);
        assert_eq!(Tier::select(Decimal::new(1200, 0), 9_000), Tier::Premium);
        assert_eq!(Tier::select(Decimal::new(100, 0), 8_001), Tier::Premium);
        assert_eq!(Tier::select(Decimal::new(100, 0), 8_000), Tier::Standard);
        assert_eq!(Tier::select(Decimal::new(12001, 1), 0), Tier::Popular);
    }

    #[test]
    fn two_draw_mode_uses_a_fresh_value_for_the_second_threshold() {
        let mut synthesizer =
            StockSynthesizer::new(ScriptedDraws::new(&[0.9, 0.1]), DrawMode::TwoDraw);
        let assessment = synthesizer.assess(&popular()).expect("valid product");

        assert_eq!(assessment.tier, Tier::Popular);
        assert_eq!(assessment.status, StockStatus::InStock);
    }

    #[test]
    fn cumulative_mode_maps_one_value_through_both_thresholds() {
        let mut synthesizer =
            StockSynthesizer::new(ScriptedDraws::new(&[0.9, 0.1]), DrawMode::Cumulative);
        let assessment = synthesizer.assess(&popular()).expect("valid product");

        assert_eq!(assessment.status, StockStatus::OutOfStock);
        assert_eq!(synthesizer.draws.remaining(), 1, "cumulative mode consumes one draw");
    }

    #[test]
    fn first_threshold_hit_consumes_a_single_draw() {
        let mut synthesizer =
            StockSynthesizer::new(ScriptedDraws::new(&[0.1, 0.1]), DrawMode::TwoDraw);
        let statuses =
            synthesizer.synthesize(&[popular(), standard()]).expect("valid products");

        assert_eq!(statuses, vec![StockStatus::LowStock, StockStatus::InStock]);
        assert_eq!(synthesizer.draws.remaining(), 0);
    }

    #[test]
    fn each_tier_follows_its_own_thresholds() {
        let cases = [
            (premium(), [0.69, 0.0], StockStatus::InStock),
            (premium(), [0.75, 0.89], StockStatus::LowStock),
            (premium(), [0.75, 0.95], StockStatus::OutOfStock),
            (standard(), [0.49, 0.0], StockStatus::InStock),
            (standard(), [0.55, 0.79], StockStatus::LowStock),
            (standard(), [0.55, 0.8], StockStatus::OutOfStock),
            (popular(), [0.59, 0.0], StockStatus::LowStock),
            (popular(), [0.6, 0.8], StockStatus::OutOfStock),
        ];

        for (record, draws, expected) in cases {
            let mut synthesizer =
                StockSynthesizer::new(ScriptedDraws::new(&draws), DrawMode::TwoDraw);
            let assessment = synthesizer.assess(&record).expect("valid product");
            assert_eq!(
                assessment.status, expected,
                "tier {} with draws {draws:?}",
                assessment.tier
            );
        }
    }

    #[test]
    fn synthesize_preserves_length_order_and_label_set() {
        let catalog: Vec<_> = (0..50)
            .map(|id| product(id, Decimal::new(30 + (id as i64 % 20), 1), (id as u32) * 13, "4,200円"))
            .collect();

        let mut synthesizer = StockSynthesizer::new(RngDraws::seeded(7), DrawMode::TwoDraw);
        let statuses = synthesizer.synthesize(&catalog).expect("valid products");

        assert_eq!(statuses.len(), catalog.len());
        assert!(statuses.iter().all(|status| StockStatus::ALL.contains(status)));
        assert_eq!(StockDistribution::from_statuses(&statuses).total(), catalog.len());
    }

    #[test]
    fn same_seed_reproduces_the_same_labels() {
        let catalog = vec![popular(), premium(), standard(), popular(), standard()];

        let first = StockSynthesizer::new(RngDraws::seeded(42), DrawMode::TwoDraw)
            .synthesize(&catalog)
            .expect("valid products");
        let second = StockSynthesizer::new(RngDraws::seeded(42), DrawMode::TwoDraw)
            .synthesize(&catalog)
            .expect("valid products");

        assert_eq!(first, second);
    }

    #[test]
    fn malformed_price_aborts_the_batch() {
        let catalog = vec![standard(), product(9, Decimal::new(40, 1), 10, "abc")];
        let mut synthesizer = StockSynthesizer::new(RngDraws::seeded(1), DrawMode::TwoDraw);

        let error = synthesizer.synthesize(&catalog).expect_err("bad price must fail");
        assert_eq!(
            error,
            DomainError::InvalidPrice { product_id: ProductId(9), raw: "abc".to_string() }
        );
    }

    #[test]
    fn distribution_counts_and_renders_each_status() {
        let statuses = [
            StockStatus::InStock,
            StockStatus::OutOfStock,
            StockStatus::InStock,
            StockStatus::LowStock,
        ];
        let distribution = StockDistribution::from_statuses(&statuses);

        assert_eq!(distribution.count(StockStatus::InStock), 2);
        assert_eq!(distribution.to_string(), "in_stock: 2, low_stock: 1, out_of_stock: 1");
    }

    #[test]
    fn draw_mode_parses_both_spellings() {
        assert_eq!("two-draw".parse::<DrawMode>(), Ok(DrawMode::TwoDraw));
        assert_eq!("Cumulative".parse::<DrawMode>(), Ok(DrawMode::Cumulative));
        assert!("single".parse::<DrawMode>().is_err());
    }
}
