use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superadmin,
    Admin,
    Staff,
}

/// Staff screens whose access is configurable per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Kitchen,
    Display,
    Cashier,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Kitchen, Page::Display, Page::Cashier, Page::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Kitchen => "kitchen",
            Page::Display => "display",
            Page::Cashier => "cashier",
            Page::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "superadmin" => Ok(Role::Superadmin),
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            _ => Err(AppError::bad_request("Invalid role")),
        }
    }
}

impl FromStr for Page {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Page::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| AppError::bad_request(format!("Unknown page: {s}")))
    }
}

/// Which staff screens each role may open. `superadmin` is not listed: it
/// can open everything regardless of this table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct RolePermissions(pub BTreeMap<Role, BTreeMap<Page, bool>>);

impl Default for RolePermissions {
    fn default() -> Self {
        let admin = Page::ALL.into_iter().map(|p| (p, true)).collect();
        let staff = BTreeMap::from([
            (Page::Kitchen, false),
            (Page::Display, true),
            (Page::Cashier, true),
            (Page::Admin, false),
        ]);
        Self(BTreeMap::from([(Role::Admin, admin), (Role::Staff, staff)]))
    }
}

impl RolePermissions {
    pub fn allows(&self, role: Role, page: Page) -> bool {
        if role == Role::Superadmin {
            return true;
        }
        self.0
            .get(&role)
            .and_then(|pages| pages.get(&page))
            .copied()
            .unwrap_or(false)
    }

    pub fn allows_any(&self, role: Role, pages: &[Page]) -> bool {
        pages.iter().any(|p| self.allows(role, *p))
    }
}
