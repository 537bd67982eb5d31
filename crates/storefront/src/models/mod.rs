//! Domain models for the storefront.
//!
//! These types represent validated domain objects separate from database row types.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{CartItemView, LocalCart};
pub use order::{NewOrder, Order, OrderItemView, OrderLine, OrderView, PlacedOrder};
pub use product::{NewProduct, Product, Rating};
pub use user::{NewUser, Role, User};
