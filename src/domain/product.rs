use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

/// A sellable product and its available stock.
///
/// `quantity` is only ever decremented through [`Product::reserve_quantity`];
/// administrative updates go through [`Product::apply_changes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub description: String,
    pub tags: Vec<String>,
    pub quantity: i32,
    /// Unit price in minor currency units.
    pub price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub quantity: Option<i32>,
    pub price: Option<i64>,
}

impl Product {
    pub fn new(description: String, tags: Vec<String>, quantity: i32, price: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            description,
            tags,
            quantity,
            price,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_available(&self, requested: i32) -> bool {
        self.quantity >= requested
    }

    /// Decrement available stock by `requested`. Leaves the product untouched
    /// on failure.
    pub fn reserve_quantity(&mut self, requested: i32) -> Result<(), DomainError> {
        if requested <= 0 {
            return Err(DomainError::InvalidQuantity);
        }
        if !self.is_available(requested) {
            return Err(DomainError::InsufficientQuantity);
        }

        self.quantity -= requested;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn validate_for_creation(&self) -> Result<(), DomainError> {
        if self.description.trim().is_empty() {
            return Err(DomainError::DescriptionRequired);
        }
        if self.price <= 0 {
            return Err(DomainError::PriceInvalid);
        }
        if self.quantity < 0 {
            return Err(DomainError::QuantityNegative);
        }
        Ok(())
    }

    /// Apply an administrative edit. The product is only modified if the
    /// resulting state still validates.
    pub fn apply_changes(&mut self, changes: ProductChanges) -> Result<(), DomainError> {
        let mut updated = self.clone();
        if let Some(description) = changes.description {
            updated.description = description;
        }
        if let Some(tags) = changes.tags {
            updated.tags = tags;
        }
        if let Some(quantity) = changes.quantity {
            updated.quantity = quantity;
        }
        if let Some(price) = changes.price {
            updated.price = price;
        }
        updated.validate_for_creation()?;
        updated.updated_at = Utc::now();

        *self = updated;
        Ok(())
    }
}
