use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::TransactionManager;
use crate::domain::{Product, ProductChanges, RequestContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProductRequest {
    pub description: String,
    pub tags: Vec<String>,
    pub quantity: i32,
    pub price: i64,
}

pub struct ProductService<T> {
    tx: T,
}

impl<T: TransactionManager> ProductService<T> {
    pub fn new(tx: T) -> Self {
        Self { tx }
    }

    pub fn create_product(
        &self,
        ctx: &RequestContext,
        request: CreateProductRequest,
    ) -> Result<Product, DomainError> {
        let product = Product::new(
            request.description,
            request.tags,
            request.quantity,
            request.price,
        );
        product.validate_for_creation()?;

        self.tx
            .with_repositories(ctx, |repos| repos.products().create(&product))?;
        log::info!(
            "created product {} (quantity {}, price {})",
            product.id,
            product.quantity,
            product.price
        );
        Ok(product)
    }

    pub fn get_product(&self, ctx: &RequestContext, id: Uuid) -> Result<Product, DomainError> {
        self.tx
            .with_repositories(ctx, |repos| repos.products().get_by_id(id))
    }

    pub fn list_products(
        &self,
        ctx: &RequestContext,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, DomainError> {
        self.tx
            .with_repositories(ctx, |repos| repos.products().get_all(limit, offset))
    }

    /// Administrative edit. Takes the same row lock as a reservation so a
    /// stock correction cannot overwrite a concurrent decrement.
    pub fn update_product(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        changes: ProductChanges,
    ) -> Result<Product, DomainError> {
        let product = self.tx.with_transaction(ctx, |repos| {
            let mut product = repos.products().get_by_id_for_update(id)?;
            product.apply_changes(changes)?;
            repos.products().update(&product)?;
            Ok(product)
        })?;
        log::info!("updated product {}", product.id);
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryStore;

    fn ctx() -> RequestContext {
        RequestContext::background()
    }

    fn request(description: &str, quantity: i32, price: i64) -> CreateProductRequest {
        CreateProductRequest {
            description: description.to_string(),
            tags: vec!["kitchen".to_string()],
            quantity,
            price,
        }
    }

    #[test]
    fn create_and_get_product() {
        let service = ProductService::new(InMemoryStore::new());

        let created = service
            .create_product(&ctx(), request("Kettle", 5, 3999))
            .expect("create_product");
        let loaded = service.get_product(&ctx(), created.id).expect("get_product");

        assert_eq!(loaded, created);
        assert_eq!(loaded.tags, vec!["kitchen".to_string()]);
    }

    #[test]
    fn invalid_product_is_not_stored() {
        let service = ProductService::new(InMemoryStore::new());

        let err = service
            .create_product(&ctx(), request("", 5, 3999))
            .unwrap_err();
        assert!(matches!(err, DomainError::DescriptionRequired));
        assert!(matches!(
            service.create_product(&ctx(), request("Kettle", 5, 0)),
            Err(DomainError::PriceInvalid)
        ));
        assert!(matches!(
            service.create_product(&ctx(), request("Kettle", -1, 10)),
            Err(DomainError::QuantityNegative)
        ));
        assert!(service
            .list_products(&ctx(), 10, 0)
            .expect("list")
            .is_empty());
    }

    #[test]
    fn get_unknown_product_is_not_found() {
        let service = ProductService::new(InMemoryStore::new());
        assert!(matches!(
            service.get_product(&ctx(), Uuid::new_v4()),
            Err(DomainError::ProductNotFound)
        ));
    }

    #[test]
    fn list_products_respects_limit_and_offset() {
        let service = ProductService::new(InMemoryStore::new());
        for i in 0..5 {
            service
                .create_product(&ctx(), request(&format!("Item {i}"), 1, 100))
                .expect("create_product");
        }

        assert_eq!(service.list_products(&ctx(), 3, 0).expect("page 1").len(), 3);
        assert_eq!(service.list_products(&ctx(), 3, 3).expect("page 2").len(), 2);
        assert!(service.list_products(&ctx(), 3, 9).expect("past end").is_empty());
    }

    #[test]
    fn update_product_applies_valid_changes_only() {
        let service = ProductService::new(InMemoryStore::new());
        let created = service
            .create_product(&ctx(), request("Kettle", 5, 3999))
            .expect("create_product");

        let updated = service
            .update_product(
                &ctx(),
                created.id,
                ProductChanges {
                    price: Some(2999),
                    quantity: Some(20),
                    ..Default::default()
                },
            )
            .expect("update_product");
        assert_eq!(updated.price, 2999);
        assert_eq!(updated.quantity, 20);

        let err = service
            .update_product(
                &ctx(),
                created.id,
                ProductChanges {
                    quantity: Some(-3),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::QuantityNegative));
        assert_eq!(
            service.get_product(&ctx(), created.id).expect("get").quantity,
            20
        );
    }
}
