//! # Error Types Module
//!
//! This module defines the error types raised while loading datasets. The
//! parsing pipeline itself never fails; only catalog, index and origin data
//! can be rejected, and only at load time.

/// Catalog loading and validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// Every integrity problem found in the catalog, one message per problem
    Integrity(Vec<String>),
    /// A parent chain that leads back to the named entry
    Cycle(String),
    /// The products document does not have the expected shape
    Format(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Integrity(problems) => {
                write!(f, "Catalog integrity error ({} problems): {}", problems.len(), problems.join("; "))
            }
            CatalogError::Cycle(name) => write!(f, "Catalog cycle error: parents of '{name}' lead back to it"),
            CatalogError::Format(msg) => write!(f, "Catalog format error: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Format(err.to_string())
    }
}

/// Emission factor table errors
#[derive(Debug, Clone, PartialEq)]
pub enum OriginError {
    /// The requested origin is not in the table
    UnknownOrigin(String),
    /// An origin inherits from itself through its parents
    Cycle(String),
    /// The origins document does not have the expected shape
    Format(String),
}

impl std::fmt::Display for OriginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OriginError::UnknownOrigin(origin) => write!(f, "Unknown origin: {origin}"),
            OriginError::Cycle(origin) => write!(f, "Origin cycle error: '{origin}' inherits from itself"),
            OriginError::Format(msg) => write!(f, "Origin format error: {msg}"),
        }
    }
}

impl std::error::Error for OriginError {}

impl From<serde_json::Error> for OriginError {
    fn from(err: serde_json::Error) -> Self {
        OriginError::Format(err.to_string())
    }
}

/// Persisted matching index errors
#[derive(Debug, Clone, PartialEq)]
pub enum IndexError {
    /// The index document does not have the expected shape
    Format(String),
    /// The alias index names an alias that the stem index never lists
    DanglingAlias(String),
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexError::Format(msg) => write!(f, "Index format error: {msg}"),
            IndexError::DanglingAlias(alias) => write!(f, "Index error: alias '{alias}' is not indexed"),
        }
    }
}

impl std::error::Error for IndexError {}

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        IndexError::Format(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let integrity = CatalogError::Integrity(vec!["a: no mass".to_string(), "b: no sg".to_string()]);
        assert_eq!(
            integrity.to_string(),
            "Catalog integrity error (2 problems): a: no mass; b: no sg"
        );
        assert_eq!(OriginError::UnknownOrigin("mars".to_string()).to_string(), "Unknown origin: mars");
    }

    #[test]
    fn test_from_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(CatalogError::from(err), CatalogError::Format(_)));
    }
}
