use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::{
    OrderRepository, ProductRepository, Repositories, TransactionManager, UserRepository,
};
use crate::domain::RequestContext;

use super::order_repo::PgOrderRepository;
use super::product_repo::PgProductRepository;
use super::user_repo::PgUserRepository;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<DieselError> for DomainError {
    fn from(e: DieselError) -> Self {
        if let DieselError::DatabaseError(kind, info) = &e {
            let message = info.message();
            if message.contains("lock timeout") {
                return DomainError::LockTimeout;
            }
            if message.contains("deadlock detected") {
                return DomainError::Deadlock;
            }
            if message.contains("statement timeout") {
                return DomainError::DeadlineExceeded;
            }
            if matches!(kind, DatabaseErrorKind::CheckViolation)
                && info.constraint_name() == Some("products_quantity_check")
            {
                return DomainError::InsufficientQuantity;
            }
        }
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Internal(format!("malformed stored JSON: {e}"))
    }
}

// ── Scoped repositories ──────────────────────────────────────────────────────

/// Repository handles sharing one connection. Built fresh for every unit of
/// work and dropped with it.
pub struct PgRepositories<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgRepositories<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

impl Repositories for PgRepositories<'_> {
    fn users(&mut self) -> Box<dyn UserRepository + '_> {
        Box::new(PgUserRepository::new(self.conn))
    }

    fn products(&mut self) -> Box<dyn ProductRepository + '_> {
        Box::new(PgProductRepository::new(self.conn))
    }

    fn orders(&mut self) -> Box<dyn OrderRepository + '_> {
        Box::new(PgOrderRepository::new(self.conn))
    }
}

// ── Transaction manager ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct PgTransactionManager {
    pool: DbPool,
}

impl PgTransactionManager {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Bound lock waits and statements by the time the request has left.
/// `SET LOCAL` only lasts until the enclosing transaction ends.
fn apply_deadline(conn: &mut PgConnection, ctx: &RequestContext) -> Result<(), DomainError> {
    let Some(remaining) = ctx.remaining() else {
        return Ok(());
    };
    let millis = remaining.as_millis().max(1);
    diesel::sql_query(format!("SET LOCAL lock_timeout = {millis}")).execute(conn)?;
    diesel::sql_query(format!("SET LOCAL statement_timeout = {millis}")).execute(conn)?;
    Ok(())
}

impl TransactionManager for PgTransactionManager {
    fn with_transaction<T, F>(&self, ctx: &RequestContext, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn Repositories) -> Result<T, DomainError>,
    {
        ctx.check()?;
        let mut pooled = self.pool.get()?;
        let conn: &mut PgConnection = &mut pooled;

        let result = conn.transaction::<T, DomainError, _>(|conn| {
            apply_deadline(conn, ctx)?;
            let value = work(&mut PgRepositories::new(conn))?;
            // A request abandoned mid-flight must not commit.
            ctx.check()?;
            Ok(value)
        });

        if let Err(e) = &result {
            log::debug!("transaction rolled back: {}", e);
        }
        result
    }

    fn with_repositories<T, F>(&self, ctx: &RequestContext, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn Repositories) -> Result<T, DomainError>,
    {
        ctx.check()?;
        let mut pooled = self.pool.get()?;
        let conn: &mut PgConnection = &mut pooled;
        work(&mut PgRepositories::new(conn))
    }
}
