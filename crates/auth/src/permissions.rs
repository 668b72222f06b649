use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque strings (e.g. "sweets.read"). The wildcard `"*"`
/// lets policy layers express "allow all" without listing every permission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    /// Browse the catalog, search and view the dashboard summary.
    pub const SWEETS_READ: Permission = Permission(Cow::Borrowed("sweets.read"));

    /// Buy units of an item (decrements stock).
    pub const SWEETS_PURCHASE: Permission = Permission(Cow::Borrowed("sweets.purchase"));

    /// Create, update, delete and restock items.
    pub const SWEETS_MANAGE: Permission = Permission(Cow::Borrowed("sweets.manage"));

    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
