use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::domain::Identifiable;
use crate::core::library::LoanStatus;
use crate::utils::date::{serializer, today};

// LoanEntity abstracts one borrowing of one copy. Loans are append-only
// history: returning closes the loan, it is never deleted.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub(crate) struct LoanEntity {
    pub loan_id: String,
    pub version: i64,
    pub branch_id: String,
    pub book_id: String,
    pub user_id: String,
    pub loan_status: LoanStatus,
    pub borrowed_on: NaiveDate,
    pub due_on: NaiveDate,
    pub returned_on: Option<NaiveDate>,
    pub reminder_sent_at: Option<NaiveDateTime>,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl LoanEntity {
    pub fn new(book_id: &str, user_id: &str, loan_period_days: i64) -> Self {
        let borrowed_on = today();
        Self {
            loan_id: Uuid::new_v4().to_string(),
            version: 0,
            branch_id: Uuid::new_v4().to_string(),
            book_id: book_id.to_string(),
            user_id: user_id.to_string(),
            loan_status: LoanStatus::Active,
            borrowed_on,
            due_on: borrowed_on + Duration::days(loan_period_days),
            returned_on: None,
            reminder_sent_at: None,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }
}

impl Identifiable for LoanEntity {
    fn id(&self) -> String {
        self.loan_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}
