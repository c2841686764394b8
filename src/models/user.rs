use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

/// Persisted identity record, keyed by email in the `users` collection.
///
/// Only a bcrypt hash of the account password is kept here; the credential of
/// record lives with the auth provider.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub student_id: String,
    pub email: String,  // PRIMARY KEY
    pub password_hash: String,
    pub full_name: String,
    pub identification_number: String,
    pub major: String,
    pub intake: String,
    #[serde(default)]
    pub nfc_uid: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<BsonDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<BsonDateTime>,
}

/// Partial update applied to an existing record
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UserPatch {
    pub nfc_uid: Option<String>,
}

/// Fields a user can be looked up by besides the primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    StudentId,
    Email,
}

impl UserField {
    pub fn key(&self) -> &'static str {
        match self {
            UserField::StudentId => "studentId",
            UserField::Email => "email",
        }
    }

    pub fn value_of<'a>(&self, user: &'a User) -> &'a str {
        match self {
            UserField::StudentId => &user.student_id,
            UserField::Email => &user.email,
        }
    }
}

/// Public view of a user, safe to return over HTTP
#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub student_id: String,
    pub email: String,
    pub full_name: String,
    pub identification_number: String,
    pub major: String,
    pub intake: String,
    pub nfc_uid: Option<String>,
    pub is_verified: bool,
    pub created_at: Option<i64>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile {
            student_id: user.student_id,
            email: user.email,
            full_name: user.full_name,
            identification_number: user.identification_number,
            major: user.major,
            intake: user.intake,
            nfc_uid: user.nfc_uid,
            is_verified: user.is_verified,
            created_at: user.created_at.map(|t| t.timestamp_millis()),
        }
    }
}
