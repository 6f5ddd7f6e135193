use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reusable analysis configuration (e.g. "landing page conversion audit").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Credits charged per run of this template.
    pub credit_cost: i64,
    pub created_at: DateTime<Utc>,
}
