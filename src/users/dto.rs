use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::library::Role;
use crate::utils::date::serializer;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub user_id: String,
    pub version: i64,
    pub role: Role,
    pub full_name: String,
    pub email: String,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl UserDto {
    pub fn new(role: Role, full_name: &str, email: &str) -> Self {
        Self {
            user_id: Uuid::new_v4().to_string(),
            version: 0,
            role,
            full_name: full_name.to_string(),
            email: email.to_string(),
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }
}
