//! Identity of the principal behind a request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sealshare_core::types::UserId;

/// Role of an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalRole {
    /// Ordinary account.
    Member,
    /// May administer any share.
    Admin,
}

/// Context for an authenticated request, built by the caller-facing layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting principal.
    pub user_id: UserId,
    /// Role at the time of the request.
    pub role: PrincipalRole,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Context for an ordinary member.
    pub fn member(user_id: UserId) -> Self {
        Self {
            user_id,
            role: PrincipalRole::Member,
            request_time: Utc::now(),
        }
    }

    /// Context for an administrator.
    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            role: PrincipalRole::Admin,
            request_time: Utc::now(),
        }
    }

    /// Whether the principal is an administrator.
    pub fn is_admin(&self) -> bool {
        matches!(self.role, PrincipalRole::Admin)
    }

    /// Whether the principal may manage a share owned by `owner`.
    pub fn can_manage(&self, owner: UserId) -> bool {
        self.user_id == owner || self.is_admin()
    }
}
