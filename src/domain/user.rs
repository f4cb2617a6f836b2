use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::errors::DomainError;

/// Registration rules that come from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserPolicy {
    pub min_age: i32,
    pub min_password_length: usize,
}

impl Default for UserPolicy {
    fn default() -> Self {
        Self {
            min_age: 18,
            min_password_length: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub is_married: bool,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(first_name: String, last_name: String, age: i32, is_married: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            first_name,
            last_name,
            age,
            is_married,
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn validate_for_creation(
        &self,
        plain_password: &str,
        policy: &UserPolicy,
    ) -> Result<(), DomainError> {
        if self.first_name.is_empty() {
            return Err(DomainError::FirstNameRequired);
        }
        if self.last_name.is_empty() {
            return Err(DomainError::LastNameRequired);
        }
        if self.age < policy.min_age {
            return Err(DomainError::UserTooYoung {
                min_age: policy.min_age,
            });
        }
        if plain_password.chars().count() < policy.min_password_length {
            return Err(DomainError::PasswordTooShort {
                min_length: policy.min_password_length,
            });
        }
        Ok(())
    }

    /// Hash `plain_password` with Argon2id and store the PHC string.
    pub fn set_password(&mut self, plain_password: &str) -> Result<(), DomainError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain_password.as_bytes(), &salt)
            .map_err(|e| DomainError::Internal(format!("password hashing failed: {e}")))?;

        self.password_hash = hash.to_string();
        Ok(())
    }

    pub fn check_password(&self, plain_password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.password_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(plain_password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str, age: i32) -> User {
        User::new(first.to_string(), last.to_string(), age, false)
    }

    #[test]
    fn validate_accepts_valid_user() {
        let u = user("John", "Doe", 25);
        assert!(u
            .validate_for_creation("password123", &UserPolicy::default())
            .is_ok());
    }

    #[test]
    fn validate_rejects_missing_names() {
        let policy = UserPolicy::default();
        assert!(matches!(
            user("", "Doe", 25).validate_for_creation("password123", &policy),
            Err(DomainError::FirstNameRequired)
        ));
        assert!(matches!(
            user("John", "", 25).validate_for_creation("password123", &policy),
            Err(DomainError::LastNameRequired)
        ));
    }

    #[test]
    fn validate_enforces_configured_minimum_age() {
        let err = user("John", "Doe", 17)
            .validate_for_creation("password123", &UserPolicy::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "user must be at least 18 years old");

        let strict = UserPolicy {
            min_age: 21,
            ..UserPolicy::default()
        };
        assert!(matches!(
            user("John", "Doe", 20).validate_for_creation("password123", &strict),
            Err(DomainError::UserTooYoung { min_age: 21 })
        ));
    }

    #[test]
    fn validate_enforces_password_length() {
        let err = user("John", "Doe", 25)
            .validate_for_creation("short", &UserPolicy::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "password must be at least 8 characters long");
    }

    #[test]
    fn full_name_is_trimmed() {
        assert_eq!(user("John", "Doe", 25).full_name(), "John Doe");
        assert_eq!(user("John", "", 25).full_name(), "John");
    }

    #[test]
    fn password_is_hashed_and_verifiable() {
        let mut u = user("John", "Doe", 25);
        u.set_password("testpassword123").expect("hashing failed");

        assert!(!u.password_hash.is_empty());
        assert_ne!(u.password_hash, "testpassword123");
        assert!(u.check_password("testpassword123"));
        assert!(!u.check_password("wrongpassword"));
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let mut u = user("John", "Doe", 25);
        u.set_password("testpassword123").expect("hashing failed");
        let json = serde_json::to_value(&u).expect("serialize");
        assert!(json.get("password_hash").is_none());
    }
}
