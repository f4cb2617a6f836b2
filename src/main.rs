use std::time::Duration;

use dotenvy::dotenv;
use order_reservation::handlers::AppState;
use order_reservation::infrastructure::PgTransactionManager;
use order_reservation::rate_limit::RateLimits;
use order_reservation::{build_server, create_pool, run_migrations, Config};

const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

fn to_io(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(to_io)?;

    let pool = create_pool(&config.database_url, config.pool).map_err(to_io)?;
    run_migrations(&pool).map_err(to_io)?;

    let state = AppState::new(
        PgTransactionManager::new(pool),
        config.user_policy,
        config.request_timeout,
    )
    .with_rate_limits(RateLimits::new(
        config.user_rate_limit,
        config.order_rate_limit,
    ));

    let limits = state.limits.clone();
    actix_web::rt::spawn(async move {
        let mut ticker = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
        loop {
            ticker.tick().await;
            limits.retain_recent();
        }
    });

    log::info!("Starting server at http://{}:{}", config.host, config.port);
    log::info!(
        "Swagger UI at http://{}:{}/swagger-ui/",
        config.host,
        config.port
    );

    build_server(state, &config.host, config.port)?.await
}
