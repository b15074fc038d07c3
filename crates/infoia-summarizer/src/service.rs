use async_trait::async_trait;

use crate::error::ServiceError;
use crate::types::{BatchRequest, BatchResponse};

/// A text-generation backend that condenses and translates one batch.
///
/// [`crate::ChatCompletionsClient`] is the production implementation; tests
/// substitute in-process fakes.
#[async_trait]
pub trait SummaryService: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`ServiceError`] describing why the batch could not be
    /// summarized. The caller decides whether to retry.
    async fn call(&self, request: &BatchRequest) -> Result<BatchResponse, ServiceError>;
}
