//! Application services.
//!
//! Services wrap the repositories with domain rules and domain error types;
//! route handlers call services, never repositories directly for writes.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;

pub use auth::{AuthError, AuthService, JwtKeys};
pub use cart::{CartError, CartService};
pub use checkout::{CheckoutError, CheckoutService};
pub use orders::{OrderError, OrderService};
