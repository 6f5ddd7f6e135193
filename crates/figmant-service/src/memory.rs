use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use figmant_core::analysis::{AnalysisRecord, AnalysisStatus, CreateAnalysis};
use figmant_core::credits::{CreditBalance, CreditCost};
use figmant_core::template::AnalysisTemplate;
use uuid::Uuid;

use crate::{QueryService, ServiceError};

#[derive(Default)]
struct State {
    templates: Vec<AnalysisTemplate>,
    balances: HashMap<String, i64>,
    costs: HashMap<String, i64>,
    analyses: Vec<AnalysisRecord>,
}

/// In-memory implementation of `QueryService` for tests and local
/// development. Not persistent and not shared across processes.
#[derive(Default)]
pub struct MemoryService {
    state: Mutex<State>,
}

impl MemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_template(&self, template: AnalysisTemplate) {
        self.state.lock().unwrap().templates.push(template);
    }

    pub fn set_balance(&self, user_id: &str, balance: i64) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert(user_id.to_string(), balance);
    }

    pub fn set_credit_cost(&self, action: &str, cost: i64) {
        self.state
            .lock()
            .unwrap()
            .costs
            .insert(action.to_string(), cost);
    }
}

#[async_trait]
impl QueryService for MemoryService {
    async fn list_templates(&self) -> Result<Vec<AnalysisTemplate>, ServiceError> {
        Ok(self.state.lock().unwrap().templates.clone())
    }

    async fn get_template(&self, id: &str) -> Result<AnalysisTemplate, ServiceError> {
        self.state
            .lock()
            .unwrap()
            .templates
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("template {id}")))
    }

    async fn get_credit_balance(&self, user_id: &str) -> Result<CreditBalance, ServiceError> {
        let state = self.state.lock().unwrap();
        let balance = state
            .balances
            .get(user_id)
            .copied()
            .ok_or_else(|| ServiceError::NotFound(format!("user {user_id}")))?;
        Ok(CreditBalance {
            user_id: user_id.to_string(),
            balance,
            updated_at: Utc::now(),
        })
    }

    async fn credit_cost(&self, action: &str) -> Result<CreditCost, ServiceError> {
        self.state
            .lock()
            .unwrap()
            .costs
            .get(action)
            .map(|cost| CreditCost {
                action: action.to_string(),
                cost: *cost,
            })
            .ok_or_else(|| ServiceError::NotFound(format!("credit cost for {action}")))
    }

    async fn deduct_credits(
        &self,
        user_id: &str,
        amount: i64,
    ) -> Result<CreditBalance, ServiceError> {
        if amount < 0 {
            return Err(ServiceError::InvalidInput(
                "deduction amount must be non-negative".into(),
            ));
        }
        let mut state = self.state.lock().unwrap();
        let balance = state
            .balances
            .get_mut(user_id)
            .ok_or_else(|| ServiceError::NotFound(format!("user {user_id}")))?;
        if *balance < amount {
            return Err(ServiceError::InvalidInput(format!(
                "insufficient credits: have {balance}, need {amount}"
            )));
        }
        *balance -= amount;
        Ok(CreditBalance {
            user_id: user_id.to_string(),
            balance: *balance,
            updated_at: Utc::now(),
        })
    }

    async fn create_analysis(
        &self,
        input: &CreateAnalysis,
    ) -> Result<AnalysisRecord, ServiceError> {
        if input.title.trim().is_empty() {
            return Err(ServiceError::InvalidInput("title required".into()));
        }
        let record = AnalysisRecord {
            id: Uuid::new_v4().to_string(),
            user_id: input.user_id.clone(),
            template_id: input.template_id.clone(),
            title: input.title.clone(),
            status: AnalysisStatus::Pending,
            error_message: None,
            attachment_keys: input.attachment_keys.clone(),
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().analyses.push(record.clone());
        Ok(record)
    }

    async fn get_analysis(&self, id: &str) -> Result<AnalysisRecord, ServiceError> {
        self.state
            .lock()
            .unwrap()
            .analyses
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("analysis {id}")))
    }

    async fn list_analyses(&self, user_id: &str) -> Result<Vec<AnalysisRecord>, ServiceError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .analyses
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn checkout_url(&self, user_id: &str, pack: &str) -> Result<String, ServiceError> {
        Ok(format!(
            "https://checkout.invalid/session?user={user_id}&pack={pack}"
        ))
    }
}
