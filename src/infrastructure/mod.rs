pub mod memory;
pub mod models;
pub mod order_repo;
pub mod product_repo;
pub mod transaction;
pub mod user_repo;

pub use memory::InMemoryStore;
pub use transaction::{PgRepositories, PgTransactionManager};
