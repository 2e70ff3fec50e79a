use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::cpq::pricing::{FixedRatePricingEngine, PricingEngine, PricingTrace};
use crate::domain::account_executive::AccountExecutive;
use crate::domain::customer::CustomerInfo;
use crate::domain::demo::ConfigurationOverrides;
use crate::domain::product::ServerProduct;
use crate::domain::quote::{LineConfiguration, Quote, QuoteId, QuoteLine};
use crate::errors::DomainError;

pub const DEFAULT_VALIDITY_DAYS: i64 = 30;
pub const DEFAULT_NETWORK: &str = "4x 1GbE + 2x 10GbE SFP+";
pub const DEFAULT_WARRANTY: &str = "3-year Next Business Day";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AeAssignment {
    /// Always the first roster entry. Deterministic.
    #[default]
    First,
    Random,
}

impl AeAssignment {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "first" => Some(Self::First),
            "random" => Some(Self::Random),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Random => "random",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountExecutiveRoster {
    executives: Vec<AccountExecutive>,
}

impl AccountExecutiveRoster {
    pub fn new(executives: Vec<AccountExecutive>) -> Result<Self, DomainError> {
        if executives.is_empty() {
            return Err(DomainError::InvariantViolation(
                "account executive roster must not be empty".to_string(),
            ));
        }
        Ok(Self { executives })
    }

    pub fn first(&self) -> &AccountExecutive {
        &self.executives[0]
    }

    pub fn assign(&self, strategy: AeAssignment) -> &AccountExecutive {
        match strategy {
            AeAssignment::First => self.first(),
            AeAssignment::Random => {
                self.executives.choose(&mut rand::thread_rng()).unwrap_or_else(|| self.first())
            }
        }
    }

    pub fn executives(&self) -> &[AccountExecutive] {
        &self.executives
    }
}

/// One approved product plus any literal overrides a scripted scenario carries.
#[derive(Clone, Debug, PartialEq)]
pub struct LineRequest {
    pub product: ServerProduct,
    pub quantity: u32,
    pub unit_price_override: Option<i64>,
    pub description_override: Option<String>,
    pub configuration: ConfigurationOverrides,
}

impl LineRequest {
    pub fn new(product: ServerProduct) -> Self {
        Self {
            product,
            quantity: 1,
            unit_price_override: None,
            description_override: None,
            configuration: ConfigurationOverrides::default(),
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_unit_price(mut self, unit_price: i64) -> Self {
        self.unit_price_override = Some(unit_price);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description_override = Some(description.into());
        self
    }

    pub fn with_configuration(mut self, configuration: ConfigurationOverrides) -> Self {
        self.configuration = configuration;
        self
    }

    fn into_line(self) -> Result<QuoteLine, DomainError> {
        if self.quantity == 0 {
            return Err(DomainError::InvalidQuantity { product_id: self.product.id.clone() });
        }
        let unit_price = self.unit_price_override.unwrap_or_else(|| self.product.base_price());
        let total_price = unit_price.checked_mul(i64::from(self.quantity)).ok_or_else(|| {
            DomainError::InvariantViolation(format!("line total overflow for {}", self.product.id))
        })?;
        let specs = &self.product.specifications;
        let overrides = self.configuration;
        let configuration = LineConfiguration {
            processor: overrides.processor.unwrap_or_else(|| specs.processors.clone()),
            memory: overrides.memory.unwrap_or_else(|| specs.memory.clone()),
            storage: overrides.storage.unwrap_or_else(|| specs.storage.clone()),
            network: overrides.network.unwrap_or_else(|| DEFAULT_NETWORK.to_string()),
            warranty: overrides.warranty.unwrap_or_else(|| DEFAULT_WARRANTY.to_string()),
        };

        Ok(QuoteLine {
            product_id: self.product.id,
            model: self.product.model,
            description: self.description_override.unwrap_or(self.product.description),
            quantity: self.quantity,
            unit_price,
            total_price,
            configuration,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SynthesizedQuote {
    pub quote: Quote,
    pub trace: PricingTrace,
}

pub struct QuoteSynthesizer<P = FixedRatePricingEngine> {
    pricing_engine: P,
    roster: AccountExecutiveRoster,
    assignment: AeAssignment,
    validity_days: i64,
}

impl<P> QuoteSynthesizer<P>
where
    P: PricingEngine,
{
    pub fn new(pricing_engine: P, roster: AccountExecutiveRoster) -> Self {
        Self {
            pricing_engine,
            roster,
            assignment: AeAssignment::default(),
            validity_days: DEFAULT_VALIDITY_DAYS,
        }
    }

    pub fn with_assignment(mut self, assignment: AeAssignment) -> Self {
        self.assignment = assignment;
        self
    }

    pub fn with_validity_days(mut self, validity_days: i64) -> Self {
        self.validity_days = validity_days;
        self
    }

    pub fn roster(&self) -> &AccountExecutiveRoster {
        &self.roster
    }

    pub fn assignment(&self) -> AeAssignment {
        self.assignment
    }

    /// Builds a priced quote. Fails on an empty selection; never touches the
    /// customer beyond copying it into the snapshot.
    pub fn synthesize(
        &self,
        customer: &CustomerInfo,
        requests: Vec<LineRequest>,
        now: DateTime<Utc>,
    ) -> Result<SynthesizedQuote, DomainError> {
        self.synthesize_assigned(customer, requests, now, self.assignment)
    }

    /// Same as [`Self::synthesize`] with an explicit assignment strategy.
    pub fn synthesize_assigned(
        &self,
        customer: &CustomerInfo,
        requests: Vec<LineRequest>,
        now: DateTime<Utc>,
        assignment: AeAssignment,
    ) -> Result<SynthesizedQuote, DomainError> {
        if requests.is_empty() {
            return Err(DomainError::EmptySelection);
        }

        let lines = requests.into_iter().map(LineRequest::into_line).collect::<Result<Vec<_>, _>>()?;
        let priced = self.pricing_engine.price(&lines)?;
        let assigned_ae = self.roster.assign(assignment).clone();

        let quote = Quote::new(
            QuoteId::from_timestamp(now),
            customer.clone(),
            lines,
            priced.breakdown,
            now,
            now + Duration::days(self.validity_days),
            assigned_ae,
        );

        tracing::info!(
            event_name = "quote.synthesized",
            quote_id = %quote.id,
            line_count = quote.lines.len(),
            total = quote.pricing.total,
            assigned_ae = %quote.assigned_ae.id.0,
            "quote synthesized"
        );

        Ok(SynthesizedQuote { quote, trace: priced.trace })
    }

    /// Convenience for the interactive path: every product at quantity 1 and base price.
    pub fn synthesize_products(
        &self,
        customer: &CustomerInfo,
        products: &[ServerProduct],
        now: DateTime<Utc>,
    ) -> Result<SynthesizedQuote, DomainError> {
        let requests = products.iter().cloned().map(LineRequest::new).collect();
        self.synthesize(customer, requests, now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use crate::cpq::catalog::Catalog;
    use crate::cpq::pricing::FixedRatePricingEngine;
    use crate::domain::customer::CustomerInfo;
    use crate::domain::demo::ConfigurationOverrides;
    use crate::domain::product::ProductId;
    use crate::errors::DomainError;
    use crate::fixtures::FixtureSet;

    use super::{AccountExecutiveRoster, AeAssignment, LineRequest, QuoteSynthesizer};

    fn synthesizer() -> QuoteSynthesizer {
        let fixtures = FixtureSet::builtin().expect("fixtures");
        QuoteSynthesizer::new(
            FixedRatePricingEngine::default(),
            AccountExecutiveRoster::new(fixtures.account_executives).expect("roster"),
        )
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "John Smith".to_string(),
            company: "TechCorp Inc".to_string(),
            email: "john@techcorp.com".to_string(),
            phone: None,
        }
    }

    #[test]
    fn empty_selection_is_rejected() {
        let error = synthesizer().synthesize(&customer(), Vec::new(), Utc::now()).expect_err("empty");
        assert_eq!(error, DomainError::EmptySelection);
    }

    #[test]
    fn two_unit_dl380_quote_matches_reference_pricing() {
        let catalog = Catalog::builtin().expect("catalog");
        let product =
            catalog.find(&ProductId::new("proliant-dl380-gen11")).expect("dl380").clone();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).single().expect("valid date");

        let synthesized = synthesizer()
            .synthesize(&customer(), vec![LineRequest::new(product).with_quantity(2)], now)
            .expect("quote");
        let quote = synthesized.quote;

        assert_eq!(quote.lines[0].total_price, 16_800);
        assert_eq!(quote.pricing.discount, 1_680);
        assert_eq!(quote.pricing.tax, 1_210);
        assert_eq!(quote.pricing.total, 16_330);
        assert_eq!(quote.valid_until - quote.created_at, Duration::days(30));
        assert_eq!(quote.assigned_ae.name, "Sarah Johnson");
        assert_eq!(quote.customer, customer());
        assert!(!quote.viewed());
        assert_eq!(synthesized.trace.steps.len(), 4);
    }

    #[test]
    fn overrides_replace_price_description_and_configuration() {
        let catalog = Catalog::builtin().expect("catalog");
        let product =
            catalog.find(&ProductId::new("proliant-dl580-gen11")).expect("dl580").clone();
        let request = LineRequest::new(product.clone())
            .with_unit_price(45_000)
            .with_description("GPU-accelerated configuration")
            .with_configuration(ConfigurationOverrides {
                network: Some("2x 100GbE + InfiniBand HDR".to_string()),
                ..ConfigurationOverrides::default()
            });

        let quote = synthesizer().synthesize(&customer(), vec![request], Utc::now()).expect("quote").quote;
        let line = &quote.lines[0];

        assert_eq!(line.unit_price, 45_000);
        assert_eq!(line.description, "GPU-accelerated configuration");
        assert_eq!(line.configuration.network, "2x 100GbE + InfiniBand HDR");
        assert_eq!(line.configuration.processor, product.specifications.processors);
        assert_eq!(line.configuration.warranty, super::DEFAULT_WARRANTY);
        assert_eq!(quote.pricing.total, 43_740);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let catalog = Catalog::builtin().expect("catalog");
        let product = catalog.products()[0].clone();
        let error = synthesizer()
            .synthesize(&customer(), vec![LineRequest::new(product).with_quantity(0)], Utc::now())
            .expect_err("zero quantity");
        assert!(matches!(error, DomainError::InvalidQuantity { .. }));
    }

    #[test]
    fn random_assignment_stays_within_roster() {
        let synthesizer = synthesizer().with_assignment(AeAssignment::Random);
        let catalog = Catalog::builtin().expect("catalog");
        for _ in 0..16 {
            let quote = synthesizer
                .synthesize_products(&customer(), &catalog.products()[..1], Utc::now())
                .expect("quote")
                .quote;
            assert!(synthesizer.roster().executives().contains(&quote.assigned_ae));
        }
    }

    #[test]
    fn empty_roster_is_rejected() {
        assert!(AccountExecutiveRoster::new(Vec::new()).is_err());
    }
}
