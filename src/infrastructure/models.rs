use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::{Order, OrderItem, Product, ProductSnapshot, User};
use crate::schema::{order_items, orders, products, users};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub is_married: bool,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            age: u.age,
            is_married: u.is_married,
            password_hash: u.password_hash.clone(),
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            age: row.age,
            is_married: row.is_married,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable, AsChangeset)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub description: String,
    pub tags: Value,
    pub quantity: i32,
    pub price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&Product> for ProductRow {
    type Error = DomainError;

    fn try_from(p: &Product) -> Result<Self, Self::Error> {
        Ok(Self {
            id: p.id,
            description: p.description.clone(),
            tags: serde_json::to_value(&p.tags)?,
            quantity: p.quantity,
            price: p.price,
            created_at: p.created_at,
            updated_at: p.updated_at,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = DomainError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let tags = match row.tags {
            Value::Null => Vec::new(),
            other => serde_json::from_value(other)?,
        };
        Ok(Self {
            id: row.id,
            description: row.description,
            tags,
            quantity: row.quantity,
            price: row.price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderRow {
    fn from(o: &Order) -> Self {
        Self {
            id: o.id,
            user_id: o.user_id,
            status: o.status.as_str().to_string(),
            total: o.total,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

impl OrderRow {
    /// Reassemble the aggregate from its row and its item rows, which must
    /// already be sorted by position.
    pub fn into_order(self, items: Vec<OrderItemRow>) -> Result<Order, DomainError> {
        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            status: self.status.parse()?,
            total: self.total,
            items: items
                .into_iter()
                .map(OrderItem::try_from)
                .collect::<Result<_, _>>()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Insertable)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_snapshot: Value,
    pub position: i32,
    pub quantity: i32,
    pub price_per_item: i64,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderItemRow {
    pub fn from_item(item: &OrderItem, position: usize) -> Result<Self, DomainError> {
        Ok(Self {
            id: item.id,
            order_id: item.order_id,
            product_id: item.product_id,
            product_snapshot: serde_json::to_value(&item.product_snapshot)?,
            position: i32::try_from(position)
                .map_err(|_| DomainError::Internal("too many order items".to_string()))?,
            quantity: item.quantity,
            price_per_item: item.price_per_item,
            total: item.total,
            created_at: item.created_at,
        })
    }

    pub fn rows_for(order: &Order) -> Result<Vec<Self>, DomainError> {
        order
            .items
            .iter()
            .enumerate()
            .map(|(position, item)| Self::from_item(item, position))
            .collect()
    }
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = DomainError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let product_snapshot: ProductSnapshot = serde_json::from_value(row.product_snapshot)?;
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_snapshot,
            quantity: row.quantity,
            price_per_item: row.price_per_item,
            total: row.total,
            created_at: row.created_at,
        })
    }
}
