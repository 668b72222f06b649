use std::collections::HashSet;

use thiserror::Error;

use crate::{Permission, Principal, PrincipalId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Capability proving that a principal was authorized for one permission.
///
/// Fields are private and the only constructor is [`authorize`], so holding a
/// `Grant` means the policy check already ran. Stores re-check that the grant
/// covers the permission their operation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    principal_id: PrincipalId,
    permission: Permission,
}

impl Grant {
    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    pub fn permission(&self) -> &Permission {
        &self.permission
    }

    pub fn covers(&self, required: &Permission) -> bool {
        self.permission.is_wildcard() || &self.permission == required
    }

    /// Fail unless this grant covers `required`.
    pub fn require(&self, required: &Permission) -> Result<(), AuthzError> {
        if self.covers(required) {
            Ok(())
        } else {
            Err(AuthzError::Forbidden(required.as_str().to_string()))
        }
    }
}

/// Authorize a principal for a single permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<Grant, AuthzError> {
    let perms: HashSet<&str> = principal.permissions.iter().map(|p| p.as_str()).collect();

    if perms.contains("*") || perms.contains(required.as_str()) {
        tracing::trace!(principal_id = %principal.principal_id, permission = %required, "granted");
        Ok(Grant {
            principal_id: principal.principal_id,
            permission: required.clone(),
        })
    } else {
        tracing::debug!(principal_id = %principal.principal_id, permission = %required, "denied");
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}
