use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// Body of a `POST /users` request.
///
/// Absent or `null` fields decode as empty strings and are rejected by
/// [`NewUser::validate`], so a body of `{}` is a validation failure rather than
/// a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NewUser {
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingFields;

impl NewUser {
    pub fn validate(&self) -> Result<(), MissingFields> {
        if self.name.is_empty() || self.email.is_empty() {
            return Err(MissingFields);
        }
        Ok(())
    }

    pub fn into_user(self, id: i32) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
        }
    }
}
