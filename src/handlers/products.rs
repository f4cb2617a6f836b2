use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::CreateProductRequest;
use crate::domain::ports::TransactionManager;
use crate::domain::{Product, ProductChanges};
use crate::errors::AppError;

use super::{parse_id, run_blocking, AppState, PageParams};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductBody {
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub quantity: i32,
    /// Unit price in minor currency units, e.g. 1999 for 19.99.
    pub price: i64,
}

/// Fields left out are kept as they are.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductBody {
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub quantity: Option<i32>,
    pub price: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub description: String,
    pub tags: Vec<String>,
    pub quantity: i32,
    pub price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
    pub limit: i64,
    pub offset: i64,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            description: p.description,
            tags: p.tags,
            quantity: p.quantity,
            price: p.price,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductBody,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Validation error"),
    ),
    tag = "products"
)]
pub async fn create_product<T: TransactionManager>(
    state: web::Data<AppState<T>>,
    body: web::Json<CreateProductBody>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let request = CreateProductRequest {
        description: body.description,
        tags: body.tags,
        quantity: body.quantity,
        price: body.price,
    };
    let product = run_blocking(state, move |state, ctx| {
        state.products.create_product(ctx, request)
    })
    .await?;
    Ok(HttpResponse::Created().json(ProductResponse::from(product)))
}

#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(PageParams),
    responses((status = 200, description = "Products", body = ProductListResponse)),
    tag = "products"
)]
pub async fn list_products<T: TransactionManager>(
    state: web::Data<AppState<T>>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse, AppError> {
    let (limit, offset) = query.clamped();
    let products = run_blocking(state, move |state, ctx| {
        state.products.list_products(ctx, limit, offset)
    })
    .await?;
    Ok(HttpResponse::Ok().json(ProductListResponse {
        products: products.into_iter().map(Into::into).collect(),
        limit,
        offset,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = String, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product<T: TransactionManager>(
    state: web::Data<AppState<T>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_id(&path.into_inner())?;
    let product = run_blocking(state, move |state, ctx| state.products.get_product(ctx, id)).await?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = String, Path, description = "Product UUID")),
    request_body = UpdateProductBody,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn update_product<T: TransactionManager>(
    state: web::Data<AppState<T>>,
    path: web::Path<String>,
    body: web::Json<UpdateProductBody>,
) -> Result<HttpResponse, AppError> {
    let id = parse_id(&path.into_inner())?;
    let body = body.into_inner();
    let changes = ProductChanges {
        description: body.description,
        tags: body.tags,
        quantity: body.quantity,
        price: body.price,
    };
    let product = run_blocking(state, move |state, ctx| {
        state.products.update_product(ctx, id, changes)
    })
    .await?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}
