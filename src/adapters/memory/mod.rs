//! In-memory adapters for tests and local development.

mod cart_repository;
mod coupon_repository;
mod plan_catalog;

pub use cart_repository::InMemoryCartRepository;
pub use coupon_repository::InMemoryCouponRepository;
pub use plan_catalog::InMemoryPlanCatalog;
