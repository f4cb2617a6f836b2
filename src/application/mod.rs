pub mod order_service;
pub mod product_service;
pub mod user_service;

pub use order_service::{CreateOrderRequest, OrderLineRequest, OrderService};
pub use product_service::{CreateProductRequest, ProductService};
pub use user_service::{CreateUserRequest, UserService};
