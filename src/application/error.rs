use thiserror::Error;

use crate::application::remote::ApiError;

/// Failure surfaced at a store operation boundary. Every failure is also
/// reflected in the collection-level error state and a destructive
/// notification before the result reaches the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("remote api call failed during {operation}")]
    Remote {
        operation: &'static str,
        #[source]
        source: ApiError,
    },
}

impl StoreError {
    pub(crate) fn remote(operation: &'static str, source: ApiError) -> Self {
        Self::Remote { operation, source }
    }
}
