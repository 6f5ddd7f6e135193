use async_trait::async_trait;
use figmant_core::analysis::{AnalysisRecord, CreateAnalysis};
use figmant_core::credits::{CreditBalance, CreditCost};
use figmant_core::template::AnalysisTemplate;
use reqwest::{Client, RequestBuilder, StatusCode};

use crate::{QueryService, ServiceError};

/// Async HTTP client implementation of `QueryService`.
/// Connects to the hosted Figmant backend.
pub struct HttpService {
    base_url: String,
    client: Client,
    api_key: Option<String>,
}

impl HttpService {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
            api_key: None,
        }
    }

    pub fn with_api_key(base_url: &str, key: String) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
            api_key: Some(key),
        }
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {key}")),
            None => builder,
        }
    }

    /// Check if the backend is reachable.
    /// Health endpoint is NOT authenticated.
    pub async fn health_check(&self) -> Result<(), ServiceError> {
        let resp = self
            .client
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
            .map_err(|e| ServiceError::Internal(format!("connection failed: {e}")))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ServiceError::Internal(format!(
                "health check failed: {}",
                resp.status()
            )))
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let builder = self.client.get(format!("{}{path}", self.base_url));
        let resp = self
            .with_auth(builder)
            .send()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        handle_response(resp).await
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let builder = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body);
        let resp = self
            .with_auth(builder)
            .send()
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        handle_response(resp).await
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        resp.json::<T>()
            .await
            .map_err(|e| ServiceError::Internal(format!("json decode: {e}")))
    } else {
        Err(parse_error_with_status(status, resp).await)
    }
}

async fn parse_error_with_status(status: StatusCode, resp: reqwest::Response) -> ServiceError {
    let body = resp.text().await.unwrap_or_default();
    let msg = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"].as_str().map(String::from))
        .unwrap_or(body);

    if status == StatusCode::NOT_FOUND {
        ServiceError::NotFound(msg)
    } else if status == StatusCode::BAD_REQUEST {
        ServiceError::InvalidInput(msg)
    } else {
        ServiceError::Internal(msg)
    }
}

#[async_trait]
impl QueryService for HttpService {
    async fn list_templates(&self) -> Result<Vec<AnalysisTemplate>, ServiceError> {
        self.get_json("/api/templates").await
    }

    async fn get_template(&self, id: &str) -> Result<AnalysisTemplate, ServiceError> {
        self.get_json(&format!("/api/templates/{id}")).await
    }

    async fn get_credit_balance(&self, user_id: &str) -> Result<CreditBalance, ServiceError> {
        self.get_json(&format!("/api/users/{user_id}/credits")).await
    }

    async fn credit_cost(&self, action: &str) -> Result<CreditCost, ServiceError> {
        self.get_json(&format!("/api/credit-costs/{action}")).await
    }

    async fn deduct_credits(
        &self,
        user_id: &str,
        amount: i64,
    ) -> Result<CreditBalance, ServiceError> {
        self.post_json(
            &format!("/api/users/{user_id}/credits/deduct"),
            &serde_json::json!({ "amount": amount }),
        )
        .await
    }

    async fn create_analysis(
        &self,
        input: &CreateAnalysis,
    ) -> Result<AnalysisRecord, ServiceError> {
        self.post_json("/api/analyses", input).await
    }

    async fn get_analysis(&self, id: &str) -> Result<AnalysisRecord, ServiceError> {
        self.get_json(&format!("/api/analyses/{id}")).await
    }

    async fn list_analyses(&self, user_id: &str) -> Result<Vec<AnalysisRecord>, ServiceError> {
        self.get_json(&format!("/api/users/{user_id}/analyses"))
            .await
    }

    async fn checkout_url(&self, user_id: &str, pack: &str) -> Result<String, ServiceError> {
        let val: serde_json::Value = self
            .post_json(
                "/api/billing/checkout",
                &serde_json::json!({ "user_id": user_id, "pack": pack }),
            )
            .await?;
        val["url"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| ServiceError::Internal("missing url in response".into()))
    }
}
