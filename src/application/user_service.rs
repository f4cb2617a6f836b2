use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::TransactionManager;
use crate::domain::{RequestContext, User, UserPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub is_married: bool,
    pub password: String,
}

pub struct UserService<T> {
    tx: T,
    policy: UserPolicy,
}

impl<T: TransactionManager> UserService<T> {
    pub fn new(tx: T, policy: UserPolicy) -> Self {
        Self { tx, policy }
    }

    /// Validate, hash the password, and store the user. The plain password
    /// never leaves this call.
    pub fn register_user(
        &self,
        ctx: &RequestContext,
        request: CreateUserRequest,
    ) -> Result<User, DomainError> {
        let mut user = User::new(
            request.first_name,
            request.last_name,
            request.age,
            request.is_married,
        );
        user.validate_for_creation(&request.password, &self.policy)?;
        user.set_password(&request.password)?;

        self.tx
            .with_repositories(ctx, |repos| repos.users().create(&user))?;
        log::info!("registered user {}", user.id);
        Ok(user)
    }

    pub fn get_user(&self, ctx: &RequestContext, id: Uuid) -> Result<User, DomainError> {
        self.tx
            .with_repositories(ctx, |repos| repos.users().get_by_id(id))
    }
}
