//! Plan and gateway definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::BillingCycle;
use crate::domain::foundation::{Currency, Money, ValidationError};

/// Plans offered on the pricing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanName {
    /// No charge, no end date.
    Free,
    Basic,
    Pro,
    Enterprise,
}

impl PlanName {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanName::Free => "free",
            PlanName::Basic => "basic",
            PlanName::Pro => "pro",
            PlanName::Enterprise => "enterprise",
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, PlanName::Free)
    }
}

impl fmt::Display for PlanName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(PlanName::Free),
            "basic" => Ok(PlanName::Basic),
            "pro" => Ok(PlanName::Pro),
            "enterprise" => Ok(PlanName::Enterprise),
            other => Err(ValidationError::invalid_format(
                "planName",
                format!("unknown plan '{}'", other),
            )),
        }
    }
}

/// Payment gateway a cart is routed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gateway {
    Razorpay,
    Paypal,
}

impl Gateway {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gateway::Razorpay => "razorpay",
            Gateway::Paypal => "paypal",
        }
    }
}

impl fmt::Display for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gateway {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "razorpay" => Ok(Gateway::Razorpay),
            "paypal" => Ok(Gateway::Paypal),
            other => Err(ValidationError::invalid_format(
                "gateway",
                format!("unknown gateway '{}'", other),
            )),
        }
    }
}

/// One price point of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPrice {
    pub cycle: BillingCycle,
    pub amount: Money,
}

/// Read-only catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub name: PlanName,
    pub prices: Vec<PlanPrice>,
    pub features: Vec<String>,
}

impl Plan {
    /// Catalog price for a currency and cycle.
    ///
    /// The free plan is zero in every currency whether or not prices are listed.
    pub fn price_for(&self, currency: Currency, cycle: BillingCycle) -> Option<Money> {
        if self.name.is_free() {
            return Some(Money::zero(currency));
        }
        self.prices
            .iter()
            .find(|p| p.cycle == cycle && p.amount.currency() == currency)
            .map(|p| p.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic() -> Plan {
        Plan {
            name: PlanName::Basic,
            prices: vec![
                PlanPrice {
                    cycle: BillingCycle::Monthly,
                    amount: Money::from_minor(49_900, Currency::Inr),
                },
                PlanPrice {
                    cycle: BillingCycle::Monthly,
                    amount: Money::from_minor(900, Currency::Usd),
                },
            ],
            features: vec!["1 site".into()],
        }
    }

    #[test]
    fn price_for_matches_currency_and_cycle() {
        let plan = basic();
        assert_eq!(
            plan.price_for(Currency::Usd, BillingCycle::Monthly),
            Some(Money::from_minor(900, Currency::Usd))
        );
        assert_eq!(plan.price_for(Currency::Usd, BillingCycle::Yearly), None);
    }

    #[test]
    fn free_plan_is_always_zero() {
        let plan = Plan {
            name: PlanName::Free,
            prices: vec![],
            features: vec![],
        };
        assert_eq!(
            plan.price_for(Currency::Eur, BillingCycle::Yearly),
            Some(Money::zero(Currency::Eur))
        );
    }

    #[test]
    fn plan_name_parses_case_insensitively() {
        assert_eq!("PRO".parse::<PlanName>().unwrap(), PlanName::Pro);
        assert!("platinum".parse::<PlanName>().is_err());
    }

    #[test]
    fn gateway_deserializes_from_lowercase() {
        let g: Gateway = serde_json::from_str("\"paypal\"").unwrap();
        assert_eq!(g, Gateway::Paypal);
        assert!(serde_json::from_str::<Gateway>("\"stripe\"").is_err());
    }
}
