use serde::{Deserialize, Serialize};

use crate::{Permission, PrincipalId, Role};

/// A fully resolved principal for authorization decisions.
///
/// Construction is decoupled from storage and transport: the API derives the
/// roles from verified token claims and the permissions from its role policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub principal_id: PrincipalId,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

impl Principal {
    pub fn new(principal_id: PrincipalId, roles: Vec<Role>, permissions: Vec<Permission>) -> Self {
        Self {
            principal_id,
            roles,
            permissions,
        }
    }
}
