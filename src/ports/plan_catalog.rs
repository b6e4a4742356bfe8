//! Plan catalog port (read-only).

use async_trait::async_trait;

use crate::domain::cart::{Plan, PlanName};
use crate::domain::foundation::DomainError;

/// Resolves plan names to pricing and features.
#[async_trait]
pub trait PlanCatalog: Send + Sync {
    /// Returns the plan, or `None` if the catalog does not list it.
    async fn find_plan(&self, name: PlanName) -> Result<Option<Plan>, DomainError>;

    /// All listed plans.
    async fn list_plans(&self) -> Result<Vec<Plan>, DomainError>;
}
