//! Caller identity
//!
//! The identity provider authenticates callers and hands the core an opaque
//! principal. The core trusts it and does not re-verify credentials.

use super::error::BankError;
use super::ids::UserId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub user: UserId,
    pub is_admin: bool,
}

impl Principal {
    /// A regular customer
    pub fn user(user: impl Into<String>) -> Self {
        Principal {
            user: UserId::new(user),
            is_admin: false,
        }
    }

    /// An administrator
    pub fn admin(user: impl Into<String>) -> Self {
        Principal {
            user: UserId::new(user),
            is_admin: true,
        }
    }

    /// Fail with `Forbidden` unless the principal is an administrator
    pub fn require_admin(&self, action: &str) -> Result<(), BankError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(BankError::forbidden(&self.user, action))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_admin() {
        assert!(Principal::admin("root").require_admin("approve KYC").is_ok());

        let err = Principal::user("alice")
            .require_admin("approve KYC")
            .unwrap_err();
        assert_eq!(err.to_string(), "User alice is not allowed to approve KYC");
    }
}
