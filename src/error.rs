use crate::entities::OrderStatus;
use sea_orm::DbErr;
use std::time::Duration;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Invalid order state transition: cannot go from {from} to {to}")]
    InvalidState { from: OrderStatus, to: OrderStatus },

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i32),

    #[error("Insufficient stock")]
    InsufficientStock,

    #[error("SKU not found: {0}")]
    SkuNotFound(String),

    #[error("Coupon not found")]
    CouponNotFound,

    #[error("Coupon expired or not started")]
    CouponExpired,

    #[error("Coupon out of stock")]
    CouponEmpty,

    #[error("Limit reached for this user")]
    AlreadyTaken,

    #[error("Minimum spend not met")]
    MinSpend,

    #[error("Coupon already used or invalid")]
    CouponUsed,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Invalid code or expired")]
    InvalidCode,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Config error: {0}")]
    ConfigError(String),
}

/// Failure classes a caller branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Business rule refused the change; retrying will not help.
    StateConflict,
    /// A bounded counter ran out; the caller may retry with less.
    ResourceExhausted,
    NotFound,
    InvalidInput,
    /// Connection loss, deadlock abort, timeout. Nothing was committed.
    Store,
    Internal,
}

impl AppError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::InvalidState { .. }
            | AppError::CouponUsed
            | AppError::CouponExpired
            | AppError::AlreadyTaken
            | AppError::MinSpend
            | AppError::InvalidCode => ErrorCategory::StateConflict,
            AppError::InsufficientStock | AppError::CouponEmpty | AppError::InsufficientFunds => {
                ErrorCategory::ResourceExhausted
            }
            AppError::OrderNotFound(_) | AppError::SkuNotFound(_) | AppError::CouponNotFound => {
                ErrorCategory::NotFound
            }
            AppError::InvalidQuantity(_) | AppError::ValidationError(_) => {
                ErrorCategory::InvalidInput
            }
            AppError::DatabaseError(_) | AppError::Timeout(_) => ErrorCategory::Store,
            AppError::ConfigError(_) => ErrorCategory::Internal,
        }
    }

    /// Whether re-running the whole operation is safe and may succeed.
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Store
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            AppError::InvalidState { .. } => "INVALID_STATE",
            AppError::InvalidQuantity(_) => "INVALID_QUANTITY",
            AppError::InsufficientStock => "INSUFFICIENT_STOCK",
            AppError::SkuNotFound(_) => "SKU_NOT_FOUND",
            AppError::CouponNotFound => "COUPON_NOT_FOUND",
            AppError::CouponExpired => "COUPON_EXPIRED",
            AppError::CouponEmpty => "COUPON_EMPTY",
            AppError::AlreadyTaken => "ALREADY_TAKEN",
            AppError::MinSpend => "MIN_SPEND",
            AppError::CouponUsed => "COUPON_USED",
            AppError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            AppError::InvalidCode => "INVALID_CODE",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::ConfigError(_) => "CONFIG_ERROR",
        }
    }

    /// HTTP status an outer handler should answer with.
    pub fn status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::StateConflict | ErrorCategory::ResourceExhausted => 409,
            ErrorCategory::NotFound => 404,
            ErrorCategory::InvalidInput => 400,
            ErrorCategory::Store => match self {
                AppError::Timeout(_) => 504,
                _ => 503,
            },
            ErrorCategory::Internal => 500,
        }
    }
}
