use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::{CreateOrderRequest, OrderLineRequest};
use crate::domain::ports::TransactionManager;
use crate::domain::{Order, OrderItem};
use crate::errors::AppError;

use super::{parse_id, run_blocking, AppState, PageParams};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderItemBody {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderBody {
    pub user_id: Uuid,
    pub items: Vec<CreateOrderItemBody>,
}

impl From<CreateOrderBody> for CreateOrderRequest {
    fn from(body: CreateOrderBody) -> Self {
        Self {
            user_id: body.user_id,
            items: body
                .items
                .into_iter()
                .map(|i| OrderLineRequest {
                    product_id: i.product_id,
                    quantity: i.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductSnapshotResponse {
    pub id: Uuid,
    pub description: String,
    pub tags: Vec<String>,
    /// Unit price in minor currency units at the time of ordering.
    pub price: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_snapshot: ProductSnapshotResponse,
    pub quantity: i32,
    pub price_per_item: i64,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub total: i64,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: usize,
    pub limit: i64,
    pub offset: i64,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_snapshot: ProductSnapshotResponse {
                id: item.product_snapshot.id,
                description: item.product_snapshot.description,
                tags: item.product_snapshot.tags,
                price: item.product_snapshot.price,
            },
            quantity: item.quantity,
            price_per_item: item.price_per_item,
            total: item.total,
            created_at: item.created_at,
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status.to_string(),
            total: order.total,
            items: order.items.into_iter().map(Into::into).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/v1/orders
///
/// Creates an order and reserves stock for every line in a single database
/// transaction. Either the order and all reservations are committed, or
/// nothing is.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderBody,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Validation error or insufficient stock"),
        (status = 404, description = "User or product not found"),
        (status = 429, description = "Too many orders from this client"),
        (status = 503, description = "Lock timeout or deadlock, retry later"),
    ),
    tag = "orders"
)]
pub async fn create_order<T: TransactionManager>(
    req: HttpRequest,
    state: web::Data<AppState<T>>,
    body: web::Json<CreateOrderBody>,
) -> Result<HttpResponse, AppError> {
    state.limits.order_creation.check(&req)?;
    let request = CreateOrderRequest::from(body.into_inner());
    let order = run_blocking(state, move |state, ctx| {
        state.orders.create_order(ctx, request)
    })
    .await?;
    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /api/v1/orders/{id}
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = String, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 400, description = "Malformed identifier"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order<T: TransactionManager>(
    state: web::Data<AppState<T>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_id(&path.into_inner())?;
    let order = run_blocking(state, move |state, ctx| state.orders.get_order(ctx, id)).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /api/v1/users/{id}/orders
///
/// Newest first, with items and their snapshots.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/orders",
    params(("id" = String, Path, description = "User UUID"), PageParams),
    responses(
        (status = 200, description = "Orders of the user", body = OrderListResponse),
        (status = 400, description = "Malformed identifier"),
    ),
    tag = "orders"
)]
pub async fn list_user_orders<T: TransactionManager>(
    state: web::Data<AppState<T>>,
    path: web::Path<String>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse, AppError> {
    let user_id = parse_id(&path.into_inner())?;
    let (limit, offset) = query.clamped();
    let orders = run_blocking(state, move |state, ctx| {
        state.orders.list_user_orders(ctx, user_id, limit, offset)
    })
    .await?;

    let orders: Vec<OrderResponse> = orders.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(OrderListResponse {
        total: orders.len(),
        orders,
        limit,
        offset,
    }))
}

/// PATCH /api/v1/orders/{id}/confirm
#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/confirm",
    params(("id" = String, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order confirmed", body = OrderResponse),
        (status = 400, description = "Order is not pending or has no items"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn confirm_order<T: TransactionManager>(
    state: web::Data<AppState<T>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_id(&path.into_inner())?;
    let order = run_blocking(state, move |state, ctx| state.orders.confirm_order(ctx, id)).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PATCH /api/v1/orders/{id}/cancel
#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/cancel",
    params(("id" = String, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order cancelled", body = OrderResponse),
        (status = 400, description = "Order is completed"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn cancel_order<T: TransactionManager>(
    state: web::Data<AppState<T>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_id(&path.into_inner())?;
    let order = run_blocking(state, move |state, ctx| state.orders.cancel_order(ctx, id)).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// DELETE /api/v1/orders/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    params(("id" = String, Path, description = "Order UUID")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn delete_order<T: TransactionManager>(
    state: web::Data<AppState<T>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_id(&path.into_inner())?;
    run_blocking(state, move |state, ctx| state.orders.delete_order(ctx, id)).await?;
    Ok(HttpResponse::NoContent().finish())
}
