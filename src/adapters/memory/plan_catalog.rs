//! In-memory plan catalog with the published price list.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::cart::{BillingCycle, Plan, PlanName, PlanPrice};
use crate::domain::foundation::{Currency, DomainError, Money};
use crate::ports::PlanCatalog;

#[derive(Debug, Clone)]
pub struct InMemoryPlanCatalog {
    plans: Arc<HashMap<PlanName, Plan>>,
}

/// (currency, monthly major units, yearly major units)
type PriceRow = (Currency, i64, i64);

fn priced(name: PlanName, rows: &[PriceRow], features: &[&str]) -> Plan {
    let prices = rows
        .iter()
        .flat_map(|&(currency, monthly, yearly)| {
            let per = currency.minor_per_major();
            [
                PlanPrice {
                    cycle: BillingCycle::Monthly,
                    amount: Money::from_minor(monthly * per, currency),
                },
                PlanPrice {
                    cycle: BillingCycle::Yearly,
                    amount: Money::from_minor(yearly * per, currency),
                },
            ]
        })
        .collect();
    Plan {
        name,
        prices,
        features: features.iter().map(|f| f.to_string()).collect(),
    }
}

impl InMemoryPlanCatalog {
    pub fn new(plans: impl IntoIterator<Item = Plan>) -> Self {
        Self {
            plans: Arc::new(plans.into_iter().map(|p| (p.name, p)).collect()),
        }
    }

    /// The price list shown on the pricing page.
    pub fn with_default_plans() -> Self {
        use Currency::*;
        Self::new([
            priced(PlanName::Free, &[], &["1 project", "Community support"]),
            priced(
                PlanName::Basic,
                &[(Inr, 499, 4_990), (Usd, 9, 90), (Eur, 9, 90), (Gbp, 8, 80)],
                &["5 projects", "Email support"],
            ),
            priced(
                PlanName::Pro,
                &[(Inr, 999, 9_990), (Usd, 19, 190), (Eur, 18, 180), (Gbp, 16, 160)],
                &["Unlimited projects", "Priority support", "Custom domain"],
            ),
            priced(
                PlanName::Enterprise,
                &[(Inr, 2_999, 29_990), (Usd, 49, 490), (Eur, 45, 450), (Gbp, 39, 390)],
                &["Unlimited projects", "Dedicated manager", "SSO", "SLA"],
            ),
        ])
    }
}

impl Default for InMemoryPlanCatalog {
    fn default() -> Self {
        Self::with_default_plans()
    }
}

#[async_trait]
impl PlanCatalog for InMemoryPlanCatalog {
    async fn find_plan(&self, name: PlanName) -> Result<Option<Plan>, DomainError> {
        Ok(self.plans.get(&name).cloned())
    }

    async fn list_plans(&self) -> Result<Vec<Plan>, DomainError> {
        let mut plans: Vec<Plan> = self.plans.values().cloned().collect();
        plans.sort_by_key(|p| p.name as u8);
        Ok(plans)
    }
}
