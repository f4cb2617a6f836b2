use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::OrderRepository;
use crate::domain::Order;
use crate::schema::{order_items, orders};

use super::models::{OrderItemRow, OrderRow};

pub struct PgOrderRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgOrderRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

impl OrderRepository for PgOrderRepository<'_> {
    fn create(&mut self, order: &Order) -> Result<(), DomainError> {
        // 1. Insert the order
        diesel::insert_into(orders::table)
            .values(&OrderRow::from(order))
            .execute(self.conn)?;

        // 2. Insert its items with their snapshots
        let items = OrderItemRow::rows_for(order)?;
        if !items.is_empty() {
            diesel::insert_into(order_items::table)
                .values(&items)
                .execute(self.conn)?;
        }
        Ok(())
    }

    fn get_by_id(&mut self, id: Uuid) -> Result<Order, DomainError> {
        let order = orders::table
            .find(id)
            .select(OrderRow::as_select())
            .first(self.conn)
            .optional()?;

        let Some(order) = order else {
            return Err(DomainError::OrderNotFound);
        };

        let items = OrderItemRow::belonging_to(&order)
            .select(OrderItemRow::as_select())
            .order(order_items::position.asc())
            .load(self.conn)?;

        order.into_order(items)
    }

    fn get_by_user_id(
        &mut self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, DomainError> {
        let rows = orders::table
            .filter(orders::user_id.eq(user_id))
            .select(OrderRow::as_select())
            .order((orders::created_at.desc(), orders::id.asc()))
            .limit(limit)
            .offset(offset)
            .load(self.conn)?;

        let items = OrderItemRow::belonging_to(&rows)
            .select(OrderItemRow::as_select())
            .order(order_items::position.asc())
            .load(self.conn)?
            .grouped_by(&rows);

        rows.into_iter()
            .zip(items)
            .map(|(order, items)| order.into_order(items))
            .collect()
    }

    fn update(&mut self, order: &Order) -> Result<(), DomainError> {
        let affected = diesel::update(orders::table.find(order.id))
            .set((
                orders::status.eq(order.status.as_str()),
                orders::total.eq(order.total),
                orders::updated_at.eq(order.updated_at),
            ))
            .execute(self.conn)?;
        if affected == 0 {
            return Err(DomainError::OrderNotFound);
        }

        // Stored items are immutable; only persist ones we have not seen.
        let items = OrderItemRow::rows_for(order)?;
        if !items.is_empty() {
            diesel::insert_into(order_items::table)
                .values(&items)
                .on_conflict(order_items::id)
                .do_nothing()
                .execute(self.conn)?;
        }
        Ok(())
    }

    fn delete(&mut self, id: Uuid) -> Result<(), DomainError> {
        // order_items rows go with it (ON DELETE CASCADE).
        let affected = diesel::delete(orders::table.find(id)).execute(self.conn)?;
        if affected == 0 {
            return Err(DomainError::OrderNotFound);
        }
        Ok(())
    }
}
