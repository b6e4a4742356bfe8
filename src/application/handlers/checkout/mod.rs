//! Checkout handlers.
//!
//! Command and query handlers for the cart lifecycle:
//!
//! ## Commands
//! - Creating carts (free plans complete immediately)
//! - Updating payment status through conditional writes
//! - Opening gateway orders
//! - Completing the signup handoff
//!
//! ## Queries
//! - Cart by id, and the resumption read
//! - Cart by signup token (partner and signup views)
//! - Coupon validation with discount preview

mod complete_signup;
mod completion;
mod create_cart;
mod create_gateway_order;
mod get_cart;
mod get_cart_by_signup_token;
mod load_cart;
mod update_cart_payment;
mod validate_coupon;

pub use completion::{CompletionEffects, SoftFailures};

// Commands
pub use complete_signup::{CompleteSignupCommand, CompleteSignupHandler};
pub use create_cart::{CreateCartCommand, CreateCartHandler, CreateCartResult};
pub use create_gateway_order::{
    CreateGatewayOrderCommand, CreateGatewayOrderHandler, CreateGatewayOrderResult,
};
pub use update_cart_payment::{
    UpdateCartPaymentCommand, UpdateCartPaymentHandler, UpdateCartPaymentResult,
};

// Queries
pub use get_cart::{GetCartHandler, GetCartQuery};
pub use get_cart_by_signup_token::{
    GetCartBySignupTokenHandler, GetCartBySignupTokenQuery, SignupLookup,
};
pub use load_cart::{LoadCartHandler, LoadCartQuery};
pub use validate_coupon::{ValidateCouponHandler, ValidateCouponQuery, ValidateCouponResult};
