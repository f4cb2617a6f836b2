use thiserror::Error;

/// Coarse classification of a [`DomainError`], used by the transport layer
/// to pick a status code and by callers to decide whether a retry makes sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input. Reported without side effects.
    Validation,
    /// Unknown user, product or order.
    NotFound,
    /// Stock or lifecycle conflict. Retrying with the same input fails again.
    Conflict,
    /// Lock timeout, deadlock, deadline, store unavailable.
    Transient,
}

#[derive(Debug, Error)]
pub enum DomainError {
    // ── Validation ───────────────────────────────────────────────────────────
    #[error("quantity must be greater than 0")]
    InvalidQuantity,
    #[error("description is required")]
    DescriptionRequired,
    #[error("price must be greater than 0")]
    PriceInvalid,
    #[error("quantity cannot be negative")]
    QuantityNegative,
    #[error("order must contain at least one item")]
    OrderMustHaveItems,
    #[error("first name is required")]
    FirstNameRequired,
    #[error("last name is required")]
    LastNameRequired,
    #[error("user must be at least {min_age} years old")]
    UserTooYoung { min_age: i32 },
    #[error("password must be at least {min_length} characters long")]
    PasswordTooShort { min_length: usize },
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    // ── Not found ────────────────────────────────────────────────────────────
    #[error("user not found")]
    UserNotFound,
    #[error("product not found")]
    ProductNotFound,
    #[error("order not found")]
    OrderNotFound,

    // ── Conflict / state ─────────────────────────────────────────────────────
    #[error("insufficient product quantity")]
    InsufficientStock,
    #[error("insufficient quantity available")]
    InsufficientQuantity,
    #[error("only pending orders can be confirmed")]
    OnlyPendingCanConfirm,
    #[error("cannot confirm empty order")]
    CannotConfirmEmptyOrder,
    #[error("completed orders cannot be cancelled")]
    CompletedOrdersReadonly,

    // ── Transient / infrastructure ───────────────────────────────────────────
    #[error("timed out waiting for a row lock")]
    LockTimeout,
    #[error("deadlock detected")]
    Deadlock,
    #[error("request deadline exceeded")]
    DeadlineExceeded,
    #[error("request cancelled")]
    Cancelled,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::InvalidQuantity
            | DomainError::DescriptionRequired
            | DomainError::PriceInvalid
            | DomainError::QuantityNegative
            | DomainError::OrderMustHaveItems
            | DomainError::FirstNameRequired
            | DomainError::LastNameRequired
            | DomainError::UserTooYoung { .. }
            | DomainError::PasswordTooShort { .. }
            | DomainError::InvalidIdentifier(_) => ErrorKind::Validation,

            DomainError::UserNotFound
            | DomainError::ProductNotFound
            | DomainError::OrderNotFound => ErrorKind::NotFound,

            DomainError::InsufficientStock
            | DomainError::InsufficientQuantity
            | DomainError::OnlyPendingCanConfirm
            | DomainError::CannotConfirmEmptyOrder
            | DomainError::CompletedOrdersReadonly => ErrorKind::Conflict,

            DomainError::LockTimeout
            | DomainError::Deadlock
            | DomainError::DeadlineExceeded
            | DomainError::Cancelled
            | DomainError::Internal(_) => ErrorKind::Transient,
        }
    }

    /// Stable machine-readable code for API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidQuantity => "INVALID_QUANTITY",
            DomainError::DescriptionRequired => "DESCRIPTION_REQUIRED",
            DomainError::PriceInvalid => "PRICE_INVALID",
            DomainError::QuantityNegative => "QUANTITY_NEGATIVE",
            DomainError::OrderMustHaveItems => "ORDER_MUST_HAVE_ITEMS",
            DomainError::FirstNameRequired => "FIRST_NAME_REQUIRED",
            DomainError::LastNameRequired => "LAST_NAME_REQUIRED",
            DomainError::UserTooYoung { .. } => "USER_TOO_YOUNG",
            DomainError::PasswordTooShort { .. } => "PASSWORD_TOO_SHORT",
            DomainError::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            DomainError::UserNotFound => "USER_NOT_FOUND",
            DomainError::ProductNotFound => "PRODUCT_NOT_FOUND",
            DomainError::OrderNotFound => "ORDER_NOT_FOUND",
            DomainError::InsufficientStock => "INSUFFICIENT_STOCK",
            DomainError::InsufficientQuantity => "INSUFFICIENT_QUANTITY",
            DomainError::OnlyPendingCanConfirm => "ONLY_PENDING_CAN_CONFIRM",
            DomainError::CannotConfirmEmptyOrder => "CANNOT_CONFIRM_EMPTY_ORDER",
            DomainError::CompletedOrdersReadonly => "COMPLETED_ORDERS_READONLY",
            DomainError::LockTimeout => "LOCK_TIMEOUT",
            DomainError::Deadlock => "DEADLOCK",
            DomainError::DeadlineExceeded => "DEADLINE_EXCEEDED",
            DomainError::Cancelled => "CANCELLED",
            DomainError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
