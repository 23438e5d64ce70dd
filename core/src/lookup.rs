use async_trait::async_trait;
use thiserror::Error;

use crate::models::NutrientProfile;

/// What the food database knows about a barcode.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupHit {
    pub name: Option<String>,
    pub profile: NutrientProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("No product found for barcode")]
    NotFound,

    #[error("Failed to reach food database: {0}")]
    NetworkFailure(String),

    #[error("Unusable response from food database: {0}")]
    MalformedResponse(String),
}

/// Remote product lookup by barcode.
///
/// The CLI implements this with reqwest against OpenFoodFacts; tests use
/// in-process stubs. Implementations own their timeouts; the ledger never
/// retries and treats every error the same way.
#[async_trait]
pub trait LookupGateway: Send + Sync {
    async fn lookup(&self, barcode: &str) -> Result<LookupHit, LookupError>;
}
