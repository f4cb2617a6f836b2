pub mod context;
pub mod errors;
pub mod order;
pub mod ports;
pub mod product;
pub mod user;

pub use context::RequestContext;
pub use errors::{DomainError, ErrorKind};
pub use order::{Order, OrderItem, OrderStatus, ProductSnapshot};
pub use product::{Product, ProductChanges};
pub use user::{User, UserPolicy};
