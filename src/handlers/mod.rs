pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::application::{OrderService, ProductService, UserService};
use crate::domain::errors::DomainError;
use crate::domain::ports::TransactionManager;
use crate::domain::{RequestContext, UserPolicy};
use crate::errors::AppError;
use crate::rate_limit::RateLimits;

/// Shared state handed to every handler.
pub struct AppState<T> {
    pub orders: OrderService<T>,
    pub products: ProductService<T>,
    pub users: UserService<T>,
    pub limits: RateLimits,
    pub request_timeout: Duration,
}

impl<T: TransactionManager + Clone> AppState<T> {
    pub fn new(tx: T, policy: UserPolicy, request_timeout: Duration) -> Self {
        Self {
            orders: OrderService::new(tx.clone()),
            products: ProductService::new(tx.clone()),
            users: UserService::new(tx, policy),
            limits: RateLimits::default(),
            request_timeout,
        }
    }

    pub fn with_rate_limits(mut self, limits: RateLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Run service work on the blocking pool under a fresh request context.
///
/// If the client goes away the handler future is dropped, which cancels the
/// context; an in-flight transaction then rolls back instead of committing.
pub(crate) async fn run_blocking<T, R, F>(
    state: web::Data<AppState<T>>,
    work: F,
) -> Result<R, AppError>
where
    T: TransactionManager,
    R: Send + 'static,
    F: FnOnce(&AppState<T>, &RequestContext) -> Result<R, DomainError> + Send + 'static,
{
    let ctx = RequestContext::with_timeout(state.request_timeout);
    let guard = ctx.cancel_on_drop();
    let result = web::block(move || work(&state, &ctx)).await;
    guard.disarm();
    Ok(result??)
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| DomainError::InvalidIdentifier(raw.to_string()).into())
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Number of items to return. Defaults to 10, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Number of items to skip. Defaults to 0.
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    10
}

impl PageParams {
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, 100), self.offset.max(0))
    }
}

// ── Health ───────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "health"
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok", "service": "orders" }))
}
