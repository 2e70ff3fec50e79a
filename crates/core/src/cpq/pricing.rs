use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::quote::{PricingBreakdown, QuoteLine};
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingRule {
    /// 0.5 rounds away from zero.
    #[default]
    HalfUp,
    /// Banker's rounding: 0.5 rounds to the nearest even integer.
    HalfEven,
}

impl RoundingRule {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "half_up" | "half-up" => Some(Self::HalfUp),
            "half_even" | "half-even" | "bankers" => Some(Self::HalfEven),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HalfUp => "half_up",
            Self::HalfEven => "half_even",
        }
    }

    fn strategy(&self) -> RoundingStrategy {
        match self {
            Self::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            Self::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }

    pub fn round(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(0, self.strategy())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub discount_rate: Decimal,
    pub tax_rate: Decimal,
    pub rounding: RoundingRule,
    pub currency: String,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            discount_rate: Decimal::new(10, 2),
            tax_rate: Decimal::new(8, 2),
            rounding: RoundingRule::HalfUp,
            currency: "USD".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTrace {
    pub currency: String,
    pub rounding: RoundingRule,
    pub steps: Vec<PricingTraceStep>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub breakdown: PricingBreakdown,
    pub trace: PricingTrace,
}

pub trait PricingEngine: Send + Sync {
    fn price(&self, lines: &[QuoteLine]) -> Result<PricingResult, DomainError>;
}

/// Flat discount then tax on the discounted subtotal, each rounded to whole units.
#[derive(Clone, Debug, Default)]
pub struct FixedRatePricingEngine {
    policy: PricingPolicy,
}

impl FixedRatePricingEngine {
    pub fn new(policy: PricingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }
}

impl PricingEngine for FixedRatePricingEngine {
    fn price(&self, lines: &[QuoteLine]) -> Result<PricingResult, DomainError> {
        price_lines_with_trace(lines, &self.policy)
    }
}

pub fn subtotal(lines: &[QuoteLine]) -> Result<i64, DomainError> {
    lines.iter().try_fold(0_i64, |acc, line| {
        line.unit_price
            .checked_mul(i64::from(line.quantity))
            .and_then(|total| acc.checked_add(total))
            .ok_or_else(|| DomainError::InvariantViolation("quote subtotal overflow".to_string()))
    })
}

pub fn price_lines_with_trace(
    lines: &[QuoteLine],
    policy: &PricingPolicy,
) -> Result<PricingResult, DomainError> {
    let subtotal = subtotal(lines)?;
    let discount = to_whole(policy.rounding.round(Decimal::from(subtotal) * policy.discount_rate))?;
    let taxable = subtotal - discount;
    let tax = to_whole(policy.rounding.round(Decimal::from(taxable) * policy.tax_rate))?;
    let total = subtotal - discount + tax;

    let step = |stage: &str, detail: String, amount: i64| PricingTraceStep {
        stage: stage.to_string(),
        detail,
        amount,
    };

    Ok(PricingResult {
        breakdown: PricingBreakdown {
            subtotal,
            discount,
            tax,
            total,
            currency: policy.currency.clone(),
        },
        trace: PricingTrace {
            currency: policy.currency.clone(),
            rounding: policy.rounding,
            steps: vec![
                step("subtotal", "sum(unit_price * quantity)".to_string(), subtotal),
                step(
                    "discount",
                    format!("round(subtotal * {}, {})", policy.discount_rate, policy.rounding.as_str()),
                    discount,
                ),
                step(
                    "tax",
                    format!(
                        "round((subtotal - discount) * {}, {})",
                        policy.tax_rate,
                        policy.rounding.as_str()
                    ),
                    tax,
                ),
                step("total", "subtotal - discount + tax".to_string(), total),
            ],
        },
    })
}

fn to_whole(value: Decimal) -> Result<i64, DomainError> {
    value.to_i64().ok_or_else(|| {
        DomainError::InvariantViolation(format!("amount {value} does not fit whole currency units"))
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::product::ProductId;
    use crate::domain::quote::{LineConfiguration, QuoteLine};

    use super::{
        price_lines_with_trace, FixedRatePricingEngine, PricingEngine, PricingPolicy, RoundingRule,
    };

    fn line(unit_price: i64, quantity: u32) -> QuoteLine {
        QuoteLine {
            product_id: ProductId::new("proliant-dl380-gen11"),
            model: "HPE ProLiant DL380 Gen11".to_string(),
            description: String::new(),
            quantity,
            unit_price,
            total_price: unit_price * i64::from(quantity),
            configuration: LineConfiguration::default(),
        }
    }

    #[test]
    fn reference_quote_prices_exactly() {
        let result = FixedRatePricingEngine::default()
            .price(&[line(8_400, 1), line(8_400, 1)])
            .expect("priced");

        assert_eq!(result.breakdown.subtotal, 16_800);
        assert_eq!(result.breakdown.discount, 1_680);
        assert_eq!(result.breakdown.tax, 1_210);
        assert_eq!(result.breakdown.total, 16_330);
        assert_eq!(result.trace.steps.len(), 4);
        assert_eq!(result.trace.steps[3].amount, 16_330);
    }

    #[test]
    fn total_identity_holds_for_varied_inputs() {
        let engine = FixedRatePricingEngine::default();
        for (unit_price, quantity) in [(1, 1), (5, 1), (1_450, 3), (12_500, 4), (45_000, 1), (7_777, 7)] {
            let breakdown = engine.price(&[line(unit_price, quantity)]).expect("priced").breakdown;
            assert_eq!(
                breakdown.total,
                breakdown.subtotal - breakdown.discount + breakdown.tax,
                "{unit_price} x {quantity}"
            );
        }
    }

    #[test]
    fn rounding_rule_is_an_explicit_parameter() {
        // 25 * 0.10 = 2.5 exactly
        let half_up = price_lines_with_trace(&[line(25, 1)], &PricingPolicy::default()).expect("priced");
        let half_even = price_lines_with_trace(
            &[line(25, 1)],
            &PricingPolicy { rounding: RoundingRule::HalfEven, ..PricingPolicy::default() },
        )
        .expect("priced");

        assert_eq!(half_up.breakdown.discount, 3);
        assert_eq!(half_even.breakdown.discount, 2);
    }

    #[test]
    fn custom_rates_flow_through() {
        let policy = PricingPolicy {
            discount_rate: Decimal::ZERO,
            tax_rate: Decimal::new(5, 2),
            ..PricingPolicy::default()
        };
        let breakdown = price_lines_with_trace(&[line(1_000, 2)], &policy).expect("priced").breakdown;

        assert_eq!(breakdown.discount, 0);
        assert_eq!(breakdown.tax, 100);
        assert_eq!(breakdown.total, 2_100);
    }

    #[test]
    fn rounding_rule_parses_config_spellings() {
        assert_eq!(RoundingRule::parse("half_even"), Some(RoundingRule::HalfEven));
        assert_eq!(RoundingRule::parse(" Half-Up "), Some(RoundingRule::HalfUp));
        assert_eq!(RoundingRule::parse("truncate"), None);
    }
}
