use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;
use super::product::Product;

/// Order lifecycle.
///
/// ```text
/// Pending ──► Confirmed ──► Cancelled
///    │                         ▲
///    └─────────────────────────┘
/// ```
///
/// `Completed` is reserved for fulfilment tracking; nothing produces it yet,
/// but cancellation already refuses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(DomainError::Internal(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

/// Product attributes as the customer saw them when the item was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub description: String,
    pub tags: Vec<String>,
    pub price: i64,
}

impl From<&Product> for ProductSnapshot {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            description: p.description.clone(),
            tags: p.tags.clone(),
            price: p.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_snapshot: ProductSnapshot,
    pub quantity: i32,
    pub price_per_item: i64,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total: i64,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            status: OrderStatus::Pending,
            total: 0,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append an item built from a snapshot of `product`.
    ///
    /// The availability check here only sees the product state it is handed;
    /// the authoritative check is the reservation made under the row lock.
    pub fn add_item(&mut self, product: &Product, quantity: i32) -> Result<(), DomainError> {
        if quantity <= 0 {
            return Err(DomainError::InvalidQuantity);
        }
        if !product.is_available(quantity) {
            return Err(DomainError::InsufficientStock);
        }
        let line_total = product
            .price
            .checked_mul(i64::from(quantity))
            .ok_or(DomainError::InvalidQuantity)?;
        if self.total.checked_add(line_total).is_none() {
            return Err(DomainError::InvalidQuantity);
        }

        let now = Utc::now();
        self.items.push(OrderItem {
            id: Uuid::new_v4(),
            order_id: self.id,
            product_id: product.id,
            product_snapshot: ProductSnapshot::from(product),
            quantity,
            price_per_item: product.price,
            total: line_total,
            created_at: now,
        });
        self.recalculate_total();
        self.updated_at = now;
        Ok(())
    }

    fn recalculate_total(&mut self) {
        self.total = self.items.iter().map(|item| item.total).sum();
    }

    pub fn confirm(&mut self) -> Result<(), DomainError> {
        if self.status != OrderStatus::Pending {
            return Err(DomainError::OnlyPendingCanConfirm);
        }
        if self.items.is_empty() {
            return Err(DomainError::CannotConfirmEmptyOrder);
        }

        self.status = OrderStatus::Confirmed;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if self.status == OrderStatus::Completed {
            return Err(DomainError::CompletedOrdersReadonly);
        }

        self.status = OrderStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }
}
