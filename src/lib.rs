pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod rate_limit;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::domain::errors::DomainError;
use crate::domain::ports::TransactionManager;
use crate::errors::AppError;
use crate::handlers::AppState;

pub use config::Config;
pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), DomainError> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| DomainError::Internal(format!("migration failed: {e}")))?;
    Ok(())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::users::create_user,
        handlers::users::get_user,
        handlers::products::create_product,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::update_product,
        handlers::orders::create_order,
        handlers::orders::get_order,
        handlers::orders::list_user_orders,
        handlers::orders::confirm_order,
        handlers::orders::cancel_order,
        handlers::orders::delete_order,
    ),
    components(schemas(
        handlers::users::CreateUserBody,
        handlers::users::UserResponse,
        handlers::products::CreateProductBody,
        handlers::products::UpdateProductBody,
        handlers::products::ProductResponse,
        handlers::products::ProductListResponse,
        handlers::orders::CreateOrderBody,
        handlers::orders::CreateOrderItemBody,
        handlers::orders::OrderResponse,
        handlers::orders::OrderItemResponse,
        handlers::orders::ProductSnapshotResponse,
        handlers::orders::OrderListResponse,
    )),
    tags(
        (name = "users", description = "User registration"),
        (name = "products", description = "Product catalogue and stock"),
        (name = "orders", description = "Orders and stock reservation"),
    )
)]
pub struct ApiDoc;

/// Register every route on `cfg`. Generic over the transaction manager so the
/// same routing runs against Postgres and the in-memory store.
pub fn configure_routes<T: TransactionManager>(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("invalid request body: {err}")).into()
    });

    let query_config = web::QueryConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("invalid query string: {err}")).into()
    });

    cfg.app_data(json_config)
        .app_data(query_config)
        .route("/health", web::get().to(handlers::health))
        .service(
            web::scope("/api/v1")
                .service(
                    web::scope("/users")
                        .route("", web::post().to(handlers::users::create_user::<T>))
                        .route("/{id}", web::get().to(handlers::users::get_user::<T>))
                        .route(
                            "/{id}/orders",
                            web::get().to(handlers::orders::list_user_orders::<T>),
                        ),
                )
                .service(
                    web::scope("/products")
                        .route("", web::post().to(handlers::products::create_product::<T>))
                        .route("", web::get().to(handlers::products::list_products::<T>))
                        .route("/{id}", web::get().to(handlers::products::get_product::<T>))
                        .route("/{id}", web::put().to(handlers::products::update_product::<T>)),
                )
                .service(
                    web::scope("/orders")
                        .route("", web::post().to(handlers::orders::create_order::<T>))
                        .route("/{id}", web::get().to(handlers::orders::get_order::<T>))
                        .route("/{id}", web::delete().to(handlers::orders::delete_order::<T>))
                        .route(
                            "/{id}/confirm",
                            web::patch().to(handlers::orders::confirm_order::<T>),
                        )
                        .route(
                            "/{id}/cancel",
                            web::patch().to(handlers::orders::cancel_order::<T>),
                        ),
                ),
        );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server<T: TransactionManager>(
    state: AppState<T>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure_routes::<T>)
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()))
    })
    .bind((host.to_string(), port))?
    .run())
}
