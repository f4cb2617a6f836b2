use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::UserRepository;
use crate::domain::User;
use crate::schema::users;

use super::models::UserRow;

pub struct PgUserRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgUserRepository<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

impl UserRepository for PgUserRepository<'_> {
    fn create(&mut self, user: &User) -> Result<(), DomainError> {
        diesel::insert_into(users::table)
            .values(&UserRow::from(user))
            .execute(self.conn)?;
        Ok(())
    }

    fn get_by_id(&mut self, id: Uuid) -> Result<User, DomainError> {
        users::table
            .find(id)
            .select(UserRow::as_select())
            .first(self.conn)
            .optional()?
            .map(User::from)
            .ok_or(DomainError::UserNotFound)
    }
}
