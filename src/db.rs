use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};

use crate::domain::errors::DomainError;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    pub max_size: u32,
    pub connection_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_size: 10,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

pub fn create_pool(database_url: &str, settings: PoolSettings) -> Result<DbPool, DomainError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Ok(Pool::builder()
        .max_size(settings.max_size)
        .connection_timeout(settings.connection_timeout)
        .build(manager)?)
}
