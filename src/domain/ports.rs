use uuid::Uuid;

use super::context::RequestContext;
use super::errors::DomainError;
use super::order::Order;
use super::product::Product;
use super::user::User;

pub trait UserRepository {
    fn create(&mut self, user: &User) -> Result<(), DomainError>;
    fn get_by_id(&mut self, id: Uuid) -> Result<User, DomainError>;
}

pub trait ProductRepository {
    fn create(&mut self, product: &Product) -> Result<(), DomainError>;
    fn get_by_id(&mut self, id: Uuid) -> Result<Product, DomainError>;
    /// Read the product and hold an exclusive row lock on it until the
    /// enclosing transaction ends.
    fn get_by_id_for_update(&mut self, id: Uuid) -> Result<Product, DomainError>;
    fn get_all(&mut self, limit: i64, offset: i64) -> Result<Vec<Product>, DomainError>;
    fn update(&mut self, product: &Product) -> Result<(), DomainError>;
}

pub trait OrderRepository {
    fn create(&mut self, order: &Order) -> Result<(), DomainError>;
    fn get_by_id(&mut self, id: Uuid) -> Result<Order, DomainError>;
    fn get_by_user_id(
        &mut self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, DomainError>;
    fn update(&mut self, order: &Order) -> Result<(), DomainError>;
    fn delete(&mut self, id: Uuid) -> Result<(), DomainError>;
}

/// Repository handles bound to one connection or one unit of work.
///
/// Each accessor hands out a short-lived handle borrowing the underlying
/// session; handles never outlive the closure they were given to.
pub trait Repositories {
    fn users(&mut self) -> Box<dyn UserRepository + '_>;
    fn products(&mut self) -> Box<dyn ProductRepository + '_>;
    fn orders(&mut self) -> Box<dyn OrderRepository + '_>;
}

/// The only component allowed to begin, commit or roll back.
pub trait TransactionManager: Send + Sync + 'static {
    /// Run `work` exactly once inside an atomic, isolated unit of work.
    ///
    /// Commits when `work` returns `Ok`; rolls back when it returns `Err`,
    /// panics, or `ctx` is cancelled or past its deadline.
    fn with_transaction<T, F>(&self, ctx: &RequestContext, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn Repositories) -> Result<T, DomainError>;

    /// Run `work` against repositories outside an explicit transaction.
    /// Every statement commits on its own.
    fn with_repositories<T, F>(&self, ctx: &RequestContext, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn Repositories) -> Result<T, DomainError>;
}
