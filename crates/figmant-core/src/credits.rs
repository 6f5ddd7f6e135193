use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditBalance {
    pub user_id: String,
    pub balance: i64,
    pub updated_at: DateTime<Utc>,
}

/// Cost of one analysis action, as configured server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditCost {
    pub action: String,
    pub cost: i64,
}
