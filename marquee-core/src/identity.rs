use serde::{Deserialize, Serialize};

/// Role carried in the verified identity claims.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Map a claim string onto a role. Anything unrecognised is a plain user.
    pub fn from_claim(role: &str) -> Self {
        match role {
            "ADMIN" | "SUPER_ADMIN" => Role::Admin,
            _ => Role::User,
        }
    }
}

/// The already-authenticated identity making a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: String,
    pub email: Option<String>,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, email: Option<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            email,
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_claim() {
        assert_eq!(Role::from_claim("ADMIN"), Role::Admin);
        assert_eq!(Role::from_claim("SUPER_ADMIN"), Role::Admin);
        assert_eq!(Role::from_claim("USER"), Role::User);
        assert_eq!(Role::from_claim("GUEST"), Role::User);
    }
}
