use serde::{Deserialize, Serialize};

// Identifiable defines common traits that can be shared by persistent objects
pub trait Identifiable: Sync + Send {
    fn id(&self) -> String;
    fn version(&self) -> i64;
}

// Configuration abstracts the circulation policies of a branch: how long a
// loan runs, how many open loans a member may hold, how long a promoted
// reservation stays claimable, and the borrow retry budget.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Configuration {
    pub branch_id: String,
    pub loan_period_days: i64,
    pub max_loans_per_user: i64,
    pub pickup_window_hours: i64,
    pub reminder_lead_days_min: i64,
    pub reminder_lead_days_max: i64,
    pub borrow_retry_attempts: u32,
    pub borrow_retry_backoff_ms: u64,
}

impl Configuration {
    pub fn new(branch_id: &str) -> Self {
        Configuration {
            branch_id: branch_id.to_string(),
            loan_period_days: 14,
            max_loans_per_user: 5,
            pickup_window_hours: 24,
            reminder_lead_days_min: 1,
            reminder_lead_days_max: 2,
            borrow_retry_attempts: 3,
            borrow_retry_backoff_ms: 200,
        }
    }
}
