use async_trait::async_trait;
use figmant_core::analysis::{AnalysisRecord, CreateAnalysis};
use figmant_core::credits::{CreditBalance, CreditCost};
use figmant_core::template::AnalysisTemplate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Abstraction over the backend query calls consumed by features around the
/// ingestion pipeline: template metadata, credit balances and costs, and the
/// analysis history.
///
/// `HttpService` talks to the hosted backend; `MemoryService` backs tests
/// and local development.
#[async_trait]
pub trait QueryService: Send + Sync {
    // -- Templates --
    async fn list_templates(&self) -> Result<Vec<AnalysisTemplate>, ServiceError>;
    async fn get_template(&self, id: &str) -> Result<AnalysisTemplate, ServiceError>;

    // -- Credits --
    async fn get_credit_balance(&self, user_id: &str) -> Result<CreditBalance, ServiceError>;
    /// Credits charged for one analysis action (e.g. "chat_analysis").
    async fn credit_cost(&self, action: &str) -> Result<CreditCost, ServiceError>;
    /// Spend credits; fails with `InvalidInput` on insufficient balance.
    async fn deduct_credits(
        &self,
        user_id: &str,
        amount: i64,
    ) -> Result<CreditBalance, ServiceError>;

    // -- Analysis history --
    async fn create_analysis(&self, input: &CreateAnalysis)
        -> Result<AnalysisRecord, ServiceError>;
    async fn get_analysis(&self, id: &str) -> Result<AnalysisRecord, ServiceError>;
    async fn list_analyses(&self, user_id: &str) -> Result<Vec<AnalysisRecord>, ServiceError>;

    // -- Billing redirect --
    /// The one billing call in scope: returns a URL the browser navigates
    /// to. No other interaction with the payment provider happens here.
    async fn checkout_url(&self, user_id: &str, pack: &str) -> Result<String, ServiceError>;
}
