use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::CreateUserRequest;
use crate::domain::ports::TransactionManager;
use crate::domain::User;
use crate::errors::AppError;

use super::{parse_id, run_blocking, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserBody {
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    #[serde(default)]
    pub is_married: bool,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub age: i32,
    pub is_married: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            full_name: u.full_name(),
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            age: u.age,
            is_married: u.is_married,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserBody,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 429, description = "Too many registrations from this client"),
    ),
    tag = "users"
)]
pub async fn create_user<T: TransactionManager>(
    req: HttpRequest,
    state: web::Data<AppState<T>>,
    body: web::Json<CreateUserBody>,
) -> Result<HttpResponse, AppError> {
    state.limits.user_registration.check(&req)?;
    let body = body.into_inner();
    let request = CreateUserRequest {
        first_name: body.first_name,
        last_name: body.last_name,
        age: body.age,
        is_married: body.is_married,
        password: body.password,
    };
    let user = run_blocking(state, move |state, ctx| state.users.register_user(ctx, request)).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User UUID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn get_user<T: TransactionManager>(
    state: web::Data<AppState<T>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_id(&path.into_inner())?;
    let user = run_blocking(state, move |state, ctx| state.users.get_user(ctx, id)).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
