use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::Duration;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::{
    OrderRepository, ProductRepository, Repositories, TransactionManager, UserRepository,
};
use crate::domain::{Order, Product, RequestContext, User};

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Default)]
struct StoreState {
    users: HashMap<Uuid, User>,
    products: HashMap<Uuid, Product>,
    orders: HashMap<Uuid, Order>,
}

/// In-memory store implementing the same contract as the Postgres adapter.
///
/// A transaction holds an exclusive lock over the whole store, works on a
/// private copy, and swaps it in only when the work succeeds. That is coarser
/// than row locking but gives the same observable guarantees.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn acquire(&self, ctx: &RequestContext) -> Result<MutexGuard<'_, StoreState>, DomainError> {
        loop {
            match self.state.try_lock() {
                Ok(guard) => return Ok(guard),
                // State is only replaced after successful work, so a panic
                // while the lock was held cannot have left it half-written.
                Err(TryLockError::Poisoned(poisoned)) => return Ok(poisoned.into_inner()),
                Err(TryLockError::WouldBlock) => {
                    ctx.check()?;
                    thread::sleep(LOCK_POLL_INTERVAL);
                }
            }
        }
    }
}

impl TransactionManager for InMemoryStore {
    fn with_transaction<T, F>(&self, ctx: &RequestContext, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn Repositories) -> Result<T, DomainError>,
    {
        ctx.check()?;
        let mut guard = self.acquire(ctx)?;
        let mut working = guard.clone();

        let result = work(&mut MemoryRepositories {
            state: &mut working,
        })
        .and_then(|value| ctx.check().map(|()| value));

        match result {
            Ok(value) => {
                *guard = working;
                Ok(value)
            }
            Err(e) => {
                log::debug!("rolling back in-memory transaction: {}", e);
                Err(e)
            }
        }
    }

    fn with_repositories<T, F>(&self, ctx: &RequestContext, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn Repositories) -> Result<T, DomainError>,
    {
        ctx.check()?;
        let mut guard = self.acquire(ctx)?;
        work(&mut MemoryRepositories { state: &mut *guard })
    }
}

struct MemoryRepositories<'s> {
    state: &'s mut StoreState,
}

impl Repositories for MemoryRepositories<'_> {
    fn users(&mut self) -> Box<dyn UserRepository + '_> {
        Box::new(MemoryUserRepository {
            users: &mut self.state.users,
        })
    }

    fn products(&mut self) -> Box<dyn ProductRepository + '_> {
        Box::new(MemoryProductRepository {
            products: &mut self.state.products,
        })
    }

    fn orders(&mut self) -> Box<dyn OrderRepository + '_> {
        Box::new(MemoryOrderRepository {
            orders: &mut self.state.orders,
        })
    }
}

struct MemoryUserRepository<'s> {
    users: &'s mut HashMap<Uuid, User>,
}

impl UserRepository for MemoryUserRepository<'_> {
    fn create(&mut self, user: &User) -> Result<(), DomainError> {
        if self.users.contains_key(&user.id) {
            return Err(DomainError::Internal(format!("duplicate user id {}", user.id)));
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    fn get_by_id(&mut self, id: Uuid) -> Result<User, DomainError> {
        self.users.get(&id).cloned().ok_or(DomainError::UserNotFound)
    }
}

struct MemoryProductRepository<'s> {
    products: &'s mut HashMap<Uuid, Product>,
}

impl ProductRepository for MemoryProductRepository<'_> {
    fn create(&mut self, product: &Product) -> Result<(), DomainError> {
        if self.products.contains_key(&product.id) {
            return Err(DomainError::Internal(format!(
                "duplicate product id {}",
                product.id
            )));
        }
        self.products.insert(product.id, product.clone());
        Ok(())
    }

    fn get_by_id(&mut self, id: Uuid) -> Result<Product, DomainError> {
        self.products
            .get(&id)
            .cloned()
            .ok_or(DomainError::ProductNotFound)
    }

    fn get_by_id_for_update(&mut self, id: Uuid) -> Result<Product, DomainError> {
        // The transaction already holds the store-wide lock.
        self.get_by_id(id)
    }

    fn get_all(&mut self, limit: i64, offset: i64) -> Result<Vec<Product>, DomainError> {
        let mut all: Vec<&Product> = self.products.values().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(page(all, limit, offset).into_iter().cloned().collect())
    }

    fn update(&mut self, product: &Product) -> Result<(), DomainError> {
        if product.quantity < 0 {
            return Err(DomainError::InsufficientQuantity);
        }
        match self.products.get_mut(&product.id) {
            Some(stored) => {
                *stored = product.clone();
                Ok(())
            }
            None => Err(DomainError::ProductNotFound),
        }
    }
}

struct MemoryOrderRepository<'s> {
    orders: &'s mut HashMap<Uuid, Order>,
}

impl OrderRepository for MemoryOrderRepository<'_> {
    fn create(&mut self, order: &Order) -> Result<(), DomainError> {
        if self.orders.contains_key(&order.id) {
            return Err(DomainError::Internal(format!(
                "duplicate order id {}",
                order.id
            )));
        }
        self.orders.insert(order.id, order.clone());
        Ok(())
    }

    fn get_by_id(&mut self, id: Uuid) -> Result<Order, DomainError> {
        self.orders.get(&id).cloned().ok_or(DomainError::OrderNotFound)
    }

    fn get_by_user_id(
        &mut self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, DomainError> {
        let mut owned: Vec<&Order> = self
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(page(owned, limit, offset).into_iter().cloned().collect())
    }

    fn update(&mut self, order: &Order) -> Result<(), DomainError> {
        match self.orders.get_mut(&order.id) {
            Some(stored) => {
                // Items are immutable once stored; only new ones are appended.
                let known: Vec<Uuid> = stored.items.iter().map(|i| i.id).collect();
                let mut items = stored.items.clone();
                items.extend(
                    order
                        .items
                        .iter()
                        .filter(|i| !known.contains(&i.id))
                        .cloned(),
                );
                *stored = Order {
                    items,
                    ..order.clone()
                };
                Ok(())
            }
            None => Err(DomainError::OrderNotFound),
        }
    }

    fn delete(&mut self, id: Uuid) -> Result<(), DomainError> {
        self.orders
            .remove(&id)
            .map(|_| ())
            .ok_or(DomainError::OrderNotFound)
    }
}

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(limit).collect()
}
