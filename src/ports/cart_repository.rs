//! Cart repository port.
//!
//! Defines the contract for persisting and retrieving Cart aggregates.
//!
//! # Design
//!
//! - **Conditional writes**: status changes go through `compare_and_swap_status`
//!   so two concurrent completions cannot both apply
//! - **Mint-if-absent**: the stored signup token is never overwritten
//! - **Token lookup has no status filter**: callers decide what status they accept
//!
//! # Example
//!
//! ```ignore
//! let mut next = cart.clone();
//! next.apply_payment(change, now)?;
//! match repo.compare_and_swap_status(cart.payment.status, &next).await? {
//!     CasOutcome::Applied(stored) => stored,
//!     CasOutcome::Rejected(current) => current, // lost the race, re-read
//!     CasOutcome::NotFound => return Err(CheckoutError::cart_not_found(cart.id)),
//! }
//! ```

use async_trait::async_trait;

use crate::domain::cart::{Cart, PaymentStatus};
use crate::domain::foundation::{CartId, DomainError, Timestamp};

/// Result of a conditional status write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasOutcome {
    /// The write happened; the stored cart is returned.
    Applied(Cart),
    /// The stored status no longer matched; the current cart is returned.
    Rejected(Cart),
    /// No cart with that id.
    NotFound,
}

/// Repository port for Cart aggregate persistence.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Save a new cart.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure or duplicate id
    async fn save(&self, cart: &Cart) -> Result<(), DomainError>;

    /// Overwrite non-status fields of an existing cart (last write wins).
    ///
    /// Payment status, signup token and signup flag are left untouched.
    ///
    /// # Errors
    ///
    /// - `CartNotFound` if the cart doesn't exist
    async fn update(&self, cart: &Cart) -> Result<(), DomainError>;

    /// Find a cart by its ID.
    async fn find_by_id(&self, id: &CartId) -> Result<Option<Cart>, DomainError>;

    /// Find a cart by signup token, whatever its status.
    async fn find_by_signup_token(&self, token: &str) -> Result<Option<Cart>, DomainError>;

    /// Write `cart`'s payment state only if the stored status equals `expected`.
    ///
    /// Writes status, transaction id, payment method, subscription dates and
    /// activity, gateway order id and `updated_at`. The signup token and its
    /// expiry are written only if none is stored yet.
    async fn compare_and_swap_status(
        &self,
        expected: PaymentStatus,
        cart: &Cart,
    ) -> Result<CasOutcome, DomainError>;

    /// Set the signup-completed flag if it is still false.
    ///
    /// Returns `false` if the flag was already set or the cart is missing.
    async fn mark_signup_completed(&self, id: &CartId, at: Timestamp) -> Result<bool, DomainError>;
}
