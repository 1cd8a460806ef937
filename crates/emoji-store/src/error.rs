//! Error types for the emoji store

use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    /// Insert rejected because the key already exists
    Constraint(String),
    Database(Box<sqlx::Error>),
    Closed,
}

impl StoreError {
    pub fn is_constraint(&self) -> bool {
        matches!(self, StoreError::Constraint(_))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Constraint(key) => write!(f, "Constraint error: key {} already exists", key),
            StoreError::Database(err) => write!(f, "Database error: {}", err),
            StoreError::Closed => write!(f, "Store is closed"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => StoreError::Closed,
            other => StoreError::Database(Box::new(other)),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_error_display() {
        let err = StoreError::Constraint("blobcat".to_string());
        assert_eq!(
            format!("{}", err),
            "Constraint error: key blobcat already exists"
        );
        assert!(err.is_constraint());
    }

    #[test]
    fn test_pool_closed_maps_to_closed() {
        let err = StoreError::from(sqlx::Error::PoolClosed);
        assert!(matches!(err, StoreError::Closed));
        assert!(!err.is_constraint());
    }

    #[test]
    fn test_error_is_debug() {
        let err = StoreError::Closed;
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Closed"));
    }
}
