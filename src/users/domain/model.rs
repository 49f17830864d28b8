use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::domain::Identifiable;
use crate::core::library::Role;
use crate::utils::date::serializer;

// UserEntity abstracts a library member. Authentication and sessions are
// owned by the request layer; circulation only resolves members by id.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub(crate) struct UserEntity {
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

impl UserEntity {
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

impl Identifiable for UserEntity {
    fn id(&self) -> String {
        self.user_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}
