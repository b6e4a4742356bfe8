//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresCartRepository` - Carts with conditional status writes
//! - `PostgresCouponRepository` - Coupon lookup and redemption counting

mod cart_repository;
mod coupon_repository;

pub use cart_repository::PostgresCartRepository;
pub use coupon_repository::PostgresCouponRepository;
