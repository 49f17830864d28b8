use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use crate::core::library::LoanStatus;
use crate::utils::date::serializer;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LoanDto {
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

#[cfg(test)]
mod tests {
    use crate::core::library::LoanStatus;
    use crate::loans::domain::model::LoanEntity;
    use crate::loans::dto::LoanDto;

    #[tokio::test]
    async fn test_should_build_loan_dto_from_entity() {
        let loan = LoanEntity::new("book1", "user1", 14);
        let dto = LoanDto::from(&loan);
        assert_eq!(loan.loan_id, dto.loan_id);
        assert_eq!(LoanStatus::Active, dto.loan_status);
        assert_eq!(loan.due_on, dto.due_on);
    }
}
