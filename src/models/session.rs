use serde::{Deserialize, Serialize};

/// Caller capabilities, passed explicitly to anything whose output depends on role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub is_admin: bool,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { is_admin: false }
    }

    pub fn admin() -> Self {
        Self { is_admin: true }
    }
}
