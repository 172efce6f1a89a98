//! Catalog error types.
//!
//! Everything that can go wrong while building the in-memory catalog:
//! malformed batch data, colliding ids, unparseable seed JSON. Engine-side
//! failures live in `mortar_core::error`; nothing here crosses that line.

use mortar_core::ValidationError;
use thiserror::Error;

/// Failures while seeding or mutating a [`MemoryCatalog`](crate::MemoryCatalog).
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A batch with this id is already in the catalog.
    #[error("batch {batch_id} already exists in the catalog")]
    DuplicateBatch { batch_id: String },

    /// The batch failed structural validation.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The seed payload is not valid JSON for a batch list.
    #[error("catalog seed is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Convenience alias for catalog results.
pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_message_names_the_batch() {
        let err = CatalogError::DuplicateBatch {
            batch_id: "b-42".to_string(),
        };
        assert_eq!(err.to_string(), "batch b-42 already exists in the catalog");
    }

    #[test]
    fn test_validation_error_passes_through() {
        let err = CatalogError::from(ValidationError::MustBePositive {
            field: "units_per_pack".to_string(),
        });
        assert_eq!(err.to_string(), "units_per_pack must be positive");
    }
}
