use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::account_executive::AccountExecutive;
use crate::domain::customer::CustomerInfo;
use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

impl QuoteId {
    /// `HPE-` followed by the last six digits of the epoch milliseconds.
    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        let suffix = at.timestamp_millis().rem_euclid(1_000_000);
        Self(format!("HPE-{suffix:06}"))
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineConfiguration {
    pub processor: String,
    pub memory: String,
    pub storage: String,
    pub network: String,
    pub warranty: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub product_id: ProductId,
    pub model: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price: i64,
    pub total_price: i64,
    pub configuration: LineConfiguration,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub subtotal: i64,
    pub discount: i64,
    pub tax: i64,
    pub total: i64,
    pub currency: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub customer: CustomerInfo,
    pub lines: Vec<QuoteLine>,
    pub pricing: PricingBreakdown,
    pub created_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub assigned_ae: AccountExecutive,
    viewed: bool,
}

impl Quote {
    pub fn new(
        id: QuoteId,
        customer: CustomerInfo,
        lines: Vec<QuoteLine>,
        pricing: PricingBreakdown,
        created_at: DateTime<Utc>,
        valid_until: DateTime<Utc>,
        assigned_ae: AccountExecutive,
    ) -> Self {
        Self { id, customer, lines, pricing, created_at, valid_until, assigned_ae, viewed: false }
    }

    pub fn viewed(&self) -> bool {
        self.viewed
    }

    /// Display-only flag; the only field that may change after creation.
    pub fn mark_viewed(&mut self) {
        self.viewed = true;
    }

    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        at <= self.valid_until
    }

    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.iter().map(|line| line.product_id.clone()).collect()
    }

    pub fn total_units(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use crate::domain::account_executive::{AccountExecutive, AccountExecutiveId};
    use crate::domain::customer::CustomerInfo;
    use crate::domain::product::ProductId;

    use super::{LineConfiguration, PricingBreakdown, Quote, QuoteId, QuoteLine};

    fn quote() -> Quote {
        let created_at = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).single().expect("valid date");
        Quote::new(
            QuoteId::from_timestamp(created_at),
            CustomerInfo {
                name: "John Smith".to_string(),
                company: "TechCorp Inc".to_string(),
                email: "john@techcorp.com".to_string(),
                phone: None,
            },
            vec![QuoteLine {
                product_id: ProductId::new("proliant-dl380-gen11"),
                model: "HPE ProLiant DL380 Gen11".to_string(),
                description: "2U".to_string(),
                quantity: 2,
                unit_price: 8_400,
                total_price: 16_800,
                configuration: LineConfiguration::default(),
            }],
            PricingBreakdown {
                subtotal: 16_800,
                discount: 1_680,
                tax: 1_210,
                total: 16_330,
                currency: "USD".to_string(),
            },
            created_at,
            created_at + Duration::days(30),
            AccountExecutive {
                id: AccountExecutiveId("ae-001".to_string()),
                name: "Sarah Johnson".to_string(),
                email: "sarah.johnson@hpe.com".to_string(),
                phone: "+1-415-555-0123".to_string(),
                territory: "West Coast".to_string(),
            },
        )
    }

    #[test]
    fn quote_id_uses_last_six_millisecond_digits() {
        let at = Utc.timestamp_millis_opt(1_772_441_234_567).single().expect("valid millis");
        assert_eq!(QuoteId::from_timestamp(at).0, "HPE-234567");

        let padded = Utc.timestamp_millis_opt(1_772_440_000_042).single().expect("valid millis");
        assert_eq!(QuoteId::from_timestamp(padded).0, "HPE-000042");
    }

    #[test]
    fn viewed_flag_is_the_only_mutation() {
        let mut quote = quote();
        let before = quote.pricing.clone();
        assert!(!quote.viewed());

        quote.mark_viewed();

        assert!(quote.viewed());
        assert_eq!(quote.pricing, before);
        assert_eq!(quote.total_units(), 2);
    }

    #[test]
    fn validity_window_is_inclusive_of_expiry() {
        let quote = quote();
        assert!(quote.is_valid_at(quote.valid_until));
        assert!(!quote.is_valid_at(quote.valid_until + Duration::seconds(1)));
    }
}
