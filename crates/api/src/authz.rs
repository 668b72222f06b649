//! API-side authorization guard.
//!
//! Handlers turn the request principal into a [`Grant`] here before calling
//! the store, so the store never sees an unchecked caller.

use sweetshop_auth::{authorize, AuthzError, Grant, Permission, Principal, Role};

use crate::context::PrincipalContext;

/// Obtain a grant for `required` in the current request context.
pub fn grant(principal: &PrincipalContext, required: &Permission) -> Result<Grant, AuthzError> {
    let principal = Principal::new(
        principal.principal_id(),
        principal.roles().to_vec(),
        permissions_from_roles(principal.roles()),
    );
    authorize(&principal, required)
}

/// Role→permission policy.
///
/// `admin` manages the whole catalog; `user` may browse and buy. Unknown roles
/// contribute nothing.
pub fn permissions_from_roles(roles: &[Role]) -> Vec<Permission> {
    if roles.contains(&Role::ADMIN) {
        return vec![Permission::WILDCARD];
    }

    let mut permissions = Vec::new();
    if roles.contains(&Role::USER) {
        permissions.push(Permission::SWEETS_READ);
        permissions.push(Permission::SWEETS_PURCHASE);
    }
    permissions
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweetshop_auth::PrincipalId;

    fn ctx(roles: Vec<Role>) -> PrincipalContext {
        PrincipalContext::new(PrincipalId::new(), None, roles)
    }

    #[test]
    fn admin_gets_every_permission() {
        let admin = ctx(vec![Role::ADMIN]);
        for perm in [
            Permission::SWEETS_READ,
            Permission::SWEETS_PURCHASE,
            Permission::SWEETS_MANAGE,
        ] {
            assert!(grant(&admin, &perm).is_ok());
        }
    }

    #[test]
    fn user_can_read_and_purchase_only() {
        let user = ctx(vec![Role::USER]);
        assert!(grant(&user, &Permission::SWEETS_READ).is_ok());
        assert!(grant(&user, &Permission::SWEETS_PURCHASE).is_ok());
        assert_eq!(
            grant(&user, &Permission::SWEETS_MANAGE).unwrap_err(),
            AuthzError::Forbidden("sweets.manage".to_string())
        );
    }

    #[test]
    fn unknown_roles_get_nothing() {
        let guest = ctx(vec![Role::new("guest")]);
        assert!(grant(&guest, &Permission::SWEETS_READ).is_err());
        assert!(permissions_from_roles(&[]).is_empty());
    }
}
