use uuid::Uuid;

use crate::domain::errors::{DomainError, ErrorKind};
use crate::domain::ports::TransactionManager;
use crate::domain::{Order, RequestContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrderRequest {
    pub user_id: Uuid,
    pub items: Vec<OrderLineRequest>,
}

pub struct OrderService<T> {
    tx: T,
}

impl<T: TransactionManager> OrderService<T> {
    pub fn new(tx: T) -> Self {
        Self { tx }
    }

    /// Create an order and reserve stock for every line in one transaction.
    ///
    /// Products are locked in request order. Two requests touching the same
    /// products in opposite orders can deadlock; the store reports that as
    /// [`DomainError::Deadlock`] and the caller decides whether to retry.
    pub fn create_order(
        &self,
        ctx: &RequestContext,
        request: CreateOrderRequest,
    ) -> Result<Order, DomainError> {
        if request.items.is_empty() {
            return Err(DomainError::OrderMustHaveItems);
        }

        let result = self.tx.with_transaction(ctx, |repos| {
            repos.users().get_by_id(request.user_id)?;

            let mut order = Order::new(request.user_id);
            for line in &request.items {
                ctx.check()?;
                let mut product = repos.products().get_by_id_for_update(line.product_id)?;
                log::debug!(
                    "locked product {} (stock {}) for {} unit(s)",
                    product.id,
                    product.quantity,
                    line.quantity
                );
                order.add_item(&product, line.quantity)?;
                product.reserve_quantity(line.quantity)?;
                repos.products().update(&product)?;
            }

            repos.orders().create(&order)?;
            Ok(order)
        });

        match &result {
            Ok(order) => log::info!(
                "created order {} for user {} with {} item(s), total {}",
                order.id,
                order.user_id,
                order.items.len(),
                order.total
            ),
            Err(e) if e.kind() != ErrorKind::Transient => log::warn!(
                "order for user {} rejected: {}",
                request.user_id,
                e
            ),
            Err(e) => log::error!("order creation for user {} failed: {}", request.user_id, e),
        }
        result
    }

    pub fn get_order(&self, ctx: &RequestContext, id: Uuid) -> Result<Order, DomainError> {
        self.tx
            .with_repositories(ctx, |repos| repos.orders().get_by_id(id))
    }

    pub fn list_user_orders(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, DomainError> {
        self.tx.with_repositories(ctx, |repos| {
            repos.orders().get_by_user_id(user_id, limit, offset)
        })
    }

    // Confirm and cancel touch no inventory, so they run without the
    // reservation transaction. Concurrent calls on one order: last write wins.

    pub fn confirm_order(&self, ctx: &RequestContext, id: Uuid) -> Result<Order, DomainError> {
        let order = self.tx.with_repositories(ctx, |repos| {
            let mut order = repos.orders().get_by_id(id)?;
            order.confirm()?;
            repos.orders().update(&order)?;
            Ok(order)
        })?;
        log::info!("confirmed order {}", order.id);
        Ok(order)
    }

    pub fn cancel_order(&self, ctx: &RequestContext, id: Uuid) -> Result<Order, DomainError> {
        let order = self.tx.with_repositories(ctx, |repos| {
            let mut order = repos.orders().get_by_id(id)?;
            order.cancel()?;
            repos.orders().update(&order)?;
            Ok(order)
        })?;
        log::info!("cancelled order {}", order.id);
        Ok(order)
    }

    pub fn delete_order(&self, ctx: &RequestContext, id: Uuid) -> Result<(), DomainError> {
        self.tx
            .with_repositories(ctx, |repos| repos.orders().delete(id))?;
        log::info!("deleted order {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    use super::*;
    use crate::domain::ports::Repositories;
    use crate::domain::{OrderStatus, Product, User};
    use crate::infrastructure::InMemoryStore;

    /// Counts how often a transaction is opened.
    struct CountingTx {
        inner: InMemoryStore,
        opened: AtomicUsize,
    }

    impl TransactionManager for CountingTx {
        fn with_transaction<R, F>(&self, ctx: &RequestContext, work: F) -> Result<R, DomainError>
        where
            F: FnOnce(&mut dyn Repositories) -> Result<R, DomainError>,
        {
            self.opened.fetch_add(1, Ordering::SeqCst);
            self.inner.with_transaction(ctx, work)
        }

        fn with_repositories<R, F>(&self, ctx: &RequestContext, work: F) -> Result<R, DomainError>
        where
            F: FnOnce(&mut dyn Repositories) -> Result<R, DomainError>,
        {
            self.inner.with_repositories(ctx, work)
        }
    }

    fn ctx() -> RequestContext {
        RequestContext::background()
    }

    fn seed_user(store: &InMemoryStore) -> User {
        let user = User::new("John".to_string(), "Doe".to_string(), 25, false);
        store
            .with_repositories(&ctx(), |repos| repos.users().create(&user))
            .expect("seed user");
        user
    }

    fn seed_product(store: &InMemoryStore, quantity: i32, price: i64) -> Product {
        let product = Product::new("Widget".to_string(), vec!["tools".to_string()], quantity, price);
        store
            .with_repositories(&ctx(), |repos| repos.products().create(&product))
            .expect("seed product");
        product
    }

    fn stock(store: &InMemoryStore, id: Uuid) -> i32 {
        store
            .with_repositories(&ctx(), |repos| repos.products().get_by_id(id))
            .expect("product")
            .quantity
    }

    fn line(product: &Product, quantity: i32) -> OrderLineRequest {
        OrderLineRequest {
            product_id: product.id,
            quantity,
        }
    }

    #[test]
    fn create_order_reserves_stock_and_persists() {
        let store = InMemoryStore::new();
        let user = seed_user(&store);
        let product = seed_product(&store, 10, 1000);
        let service = OrderService::new(store.clone());

        let order = service
            .create_order(
                &ctx(),
                CreateOrderRequest {
                    user_id: user.id,
                    items: vec![line(&product, 2)],
                },
            )
            .expect("create_order failed");

        assert_eq!(order.total, 2000);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(stock(&store, product.id), 8);

        let stored = service.get_order(&ctx(), order.id).expect("get_order");
        assert_eq!(stored, order);
    }

    #[test]
    fn empty_order_is_rejected_before_opening_a_transaction() {
        let tx = CountingTx {
            inner: InMemoryStore::new(),
            opened: AtomicUsize::new(0),
        };
        let service = OrderService::new(tx);

        let err = service
            .create_order(
                &ctx(),
                CreateOrderRequest {
                    user_id: Uuid::new_v4(),
                    items: vec![],
                },
            )
            .unwrap_err();

        assert!(matches!(err, DomainError::OrderMustHaveItems));
        assert_eq!(service.tx.opened.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_user_aborts_without_reserving() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, 10, 1000);
        let service = OrderService::new(store.clone());

        let err = service
            .create_order(
                &ctx(),
                CreateOrderRequest {
                    user_id: Uuid::new_v4(),
                    items: vec![line(&product, 1)],
                },
            )
            .unwrap_err();

        assert!(matches!(err, DomainError::UserNotFound));
        assert_eq!(stock(&store, product.id), 10);
    }

    #[test]
    fn failing_later_line_rolls_back_earlier_reservations() {
        let store = InMemoryStore::new();
        let user = seed_user(&store);
        let plenty = seed_product(&store, 5, 100);
        let scarce = seed_product(&store, 1, 100);
        let service = OrderService::new(store.clone());

        let err = service
            .create_order(
                &ctx(),
                CreateOrderRequest {
                    user_id: user.id,
                    items: vec![line(&plenty, 3), line(&scarce, 2)],
                },
            )
            .unwrap_err();

        assert!(matches!(err, DomainError::InsufficientStock));
        assert_eq!(stock(&store, plenty.id), 5);
        assert_eq!(stock(&store, scarce.id), 1);
        let orders = service
            .list_user_orders(&ctx(), user.id, 10, 0)
            .expect("list");
        assert!(orders.is_empty());
    }

    #[test]
    fn unknown_product_and_invalid_quantity_abort() {
        let store = InMemoryStore::new();
        let user = seed_user(&store);
        let product = seed_product(&store, 5, 100);
        let service = OrderService::new(store.clone());

        let missing = service.create_order(
            &ctx(),
            CreateOrderRequest {
                user_id: user.id,
                items: vec![line(&product, 1), OrderLineRequest {
                    product_id: Uuid::new_v4(),
                    quantity: 1,
                }],
            },
        );
        assert!(matches!(missing, Err(DomainError::ProductNotFound)));

        let invalid = service.create_order(
            &ctx(),
            CreateOrderRequest {
                user_id: user.id,
                items: vec![line(&product, 0)],
            },
        );
        assert!(matches!(invalid, Err(DomainError::InvalidQuantity)));
        assert_eq!(stock(&store, product.id), 5);
    }

    #[test]
    fn repeated_product_lines_see_their_own_reservation() {
        let store = InMemoryStore::new();
        let user = seed_user(&store);
        let product = seed_product(&store, 3, 100);
        let service = OrderService::new(store.clone());

        let err = service
            .create_order(
                &ctx(),
                CreateOrderRequest {
                    user_id: user.id,
                    items: vec![line(&product, 2), line(&product, 2)],
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStock));
        assert_eq!(stock(&store, product.id), 3);
    }

    #[test]
    fn cancelled_context_creates_nothing() {
        let store = InMemoryStore::new();
        let user = seed_user(&store);
        let product = seed_product(&store, 3, 100);
        let service = OrderService::new(store.clone());
        let cancelled = RequestContext::background();
        cancelled.cancel();

        let err = service
            .create_order(
                &cancelled,
                CreateOrderRequest {
                    user_id: user.id,
                    items: vec![line(&product, 1)],
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Cancelled));
        assert_eq!(stock(&store, product.id), 3);
    }

    #[test]
    fn concurrent_orders_for_last_unit_never_oversell() {
        let store = InMemoryStore::new();
        let user = seed_user(&store);
        let product = seed_product(&store, 1, 1000);
        let service = Arc::new(OrderService::new(store.clone()));
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let service = Arc::clone(&service);
                let barrier = Arc::clone(&barrier);
                let request = CreateOrderRequest {
                    user_id: user.id,
                    items: vec![line(&product, 1)],
                };
                thread::spawn(move || {
                    barrier.wait();
                    service.create_order(&RequestContext::background(), request)
                })
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .collect();

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(DomainError::InsufficientStock | DomainError::InsufficientQuantity)
        )));
        assert_eq!(stock(&store, product.id), 0);
    }

    #[test]
    fn lifecycle_confirm_then_cancel() {
        let store = InMemoryStore::new();
        let user = seed_user(&store);
        let product = seed_product(&store, 10, 1000);
        let service = OrderService::new(store.clone());

        let order = service
            .create_order(
                &ctx(),
                CreateOrderRequest {
                    user_id: user.id,
                    items: vec![line(&product, 2)],
                },
            )
            .expect("create_order");

        let confirmed = service.confirm_order(&ctx(), order.id).expect("confirm");
        assert_eq!(confirmed.status, OrderStatus::Confirmed);

        let cancelled = service.cancel_order(&ctx(), order.id).expect("cancel");
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let err = service.confirm_order(&ctx(), order.id).unwrap_err();
        assert!(matches!(err, DomainError::OnlyPendingCanConfirm));
        assert_eq!(
            service.get_order(&ctx(), order.id).expect("get").status,
            OrderStatus::Cancelled
        );
    }

    #[test]
    fn confirm_cancel_and_delete_unknown_order() {
        let service = OrderService::new(InMemoryStore::new());
        let id = Uuid::new_v4();

        assert!(matches!(
            service.confirm_order(&ctx(), id),
            Err(DomainError::OrderNotFound)
        ));
        assert!(matches!(
            service.cancel_order(&ctx(), id),
            Err(DomainError::OrderNotFound)
        ));
        assert!(matches!(
            service.delete_order(&ctx(), id),
            Err(DomainError::OrderNotFound)
        ));
    }

    #[test]
    fn list_user_orders_paginates() {
        let store = InMemoryStore::new();
        let user = seed_user(&store);
        let product = seed_product(&store, 10, 100);
        let service = OrderService::new(store.clone());

        for _ in 0..3 {
            service
                .create_order(
                    &ctx(),
                    CreateOrderRequest {
                        user_id: user.id,
                        items: vec![line(&product, 1)],
                    },
                )
                .expect("create_order");
        }

        assert_eq!(service.list_user_orders(&ctx(), user.id, 2, 0).expect("page 1").len(), 2);
        assert_eq!(service.list_user_orders(&ctx(), user.id, 2, 2).expect("page 2").len(), 1);
        assert!(service
            .list_user_orders(&ctx(), Uuid::new_v4(), 10, 0)
            .expect("other user")
            .is_empty());
    }
}
