use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::domain::Product;
use crate::schema::products;

use super::models::ProductRow;

pub struct PgProductRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgProductRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

impl ProductRepository for PgProductRepository<'_> {
    fn create(&mut self, product: &Product) -> Result<(), DomainError> {
        diesel::insert_into(products::table)
            .values(&ProductRow::try_from(product)?)
            .execute(self.conn)?;
        Ok(())
    }

    fn get_by_id(&mut self, id: Uuid) -> Result<Product, DomainError> {
        products::table
            .find(id)
            .select(ProductRow::as_select())
            .first(self.conn)
            .optional()?
            .ok_or(DomainError::ProductNotFound)?
            .try_into()
    }

    fn get_by_id_for_update(&mut self, id: Uuid) -> Result<Product, DomainError> {
        // SELECT ... FOR UPDATE: blocks until concurrent holders of this row
        // commit or roll back, then sees their committed quantity.
        log::debug!("locking product {}", id);
        products::table
            .find(id)
            .select(ProductRow::as_select())
            .for_update()
            .first(self.conn)
            .optional()?
            .ok_or(DomainError::ProductNotFound)?
            .try_into()
    }

    fn get_all(&mut self, limit: i64, offset: i64) -> Result<Vec<Product>, DomainError> {
        products::table
            .select(ProductRow::as_select())
            .order((products::created_at.asc(), products::id.asc()))
            .limit(limit)
            .offset(offset)
            .load(self.conn)?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }

    fn update(&mut self, product: &Product) -> Result<(), DomainError> {
        let affected = diesel::update(products::table.find(product.id))
            .set(&ProductRow::try_from(product)?)
            .execute(self.conn)?;
        if affected == 0 {
            return Err(DomainError::ProductNotFound);
        }
        Ok(())
    }
}
