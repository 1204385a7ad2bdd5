//! Domain types.
//!
//! These types represent validated domain objects separate from database row
//! types; the `db` modules convert rows into them.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{Cart, CartItem};
pub use order::{Order, OrderItem};
pub use product::{Product, ProductVariant, ResolvedVariant};
pub use user::User;
