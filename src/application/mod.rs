//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

pub mod handlers;

pub use handlers::checkout::{
    CompleteSignupCommand, CompleteSignupHandler, CompletionEffects, CreateCartCommand,
    CreateCartHandler, CreateCartResult, CreateGatewayOrderCommand, CreateGatewayOrderHandler,
    CreateGatewayOrderResult, GetCartBySignupTokenHandler, GetCartBySignupTokenQuery,
    GetCartHandler, GetCartQuery, LoadCartHandler, LoadCartQuery, SignupLookup, SoftFailures,
    UpdateCartPaymentCommand, UpdateCartPaymentHandler, UpdateCartPaymentResult,
    ValidateCouponHandler, ValidateCouponQuery, ValidateCouponResult,
};
pub use handlers::gateway::{ProcessGatewayEventCommand, ProcessGatewayEventHandler};
