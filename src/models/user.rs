use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Login name of the seeded administrator. That account cannot be deleted.
pub const SEEDED_ADMIN_EMAIL: &str = "admin";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    // Plain text, demonstration only.
    pub password: String,
    pub is_admin: bool,
    #[serde(with = "crate::models::dates::required")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_seeded_admin(&self) -> bool {
        self.email == SEEDED_ADMIN_EMAIL
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl NewUser {
    pub fn into_user(self, id: String, now: DateTime<Utc>) -> User {
        User {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password: self.password,
            is_admin: self.is_admin,
            created_at: now,
        }
    }
}

/// Partial update: only the fields that are `Some` overwrite the stored user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub is_admin: Option<bool>,
}

impl UserPatch {
    pub fn apply_to(self, user: &mut User) {
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(password) = self.password {
            user.password = password;
        }
        if let Some(is_admin) = self.is_admin {
            user.is_admin = is_admin;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dates::utc_date;

    #[test]
    fn patch_only_overwrites_provided_fields() {
        let mut user = NewUser {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "secret".to_string(),
            is_admin: false,
        }
        .into_user("u-1".to_string(), utc_date(2024, 1, 1).unwrap());

        UserPatch {
            last_name: Some("Byron".to_string()),
            is_admin: Some(true),
            ..UserPatch::default()
        }
        .apply_to(&mut user);

        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.last_name, "Byron");
        assert_eq!(user.email, "ada@example.com");
        assert!(user.is_admin);
    }
}
