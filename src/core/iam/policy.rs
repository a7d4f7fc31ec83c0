//! Roles, principals and the per-resource policy table
//!
//! Role is the only capability axis. The table in [`requirement`] states which
//! check guards each (resource, action) pair; the engine turns that into an
//! allow/deny decision.

use crate::core::ids::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Declared role set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access to every resource
    Admin,
    /// Regular back-office user
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    /// Landing path of the role's dashboard
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin-dashboard",
            Role::User => "/user-dashboard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),
}

impl FromStr for Role {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(PolicyError::UnknownRole(other.to_string())),
        }
    }
}

/// The authenticated actor of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: RecordId,
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: RecordId, username: impl Into<String>, role: Role) -> Self {
        Principal {
            id,
            username: username.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Resource types guarded by the policy table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Supplier,
    Product,
    Inventory,
    Order,
}

impl Resource {
    /// Whether each record has a single owning principal
    pub fn is_owner_scoped(&self) -> bool {
        matches!(self, Resource::Inventory | Resource::Order)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Resource::Supplier => "supplier",
            Resource::Product => "product",
            Resource::Inventory => "inventory item",
            Resource::Order => "order",
        }
    }
}

/// Operations a service performs on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    Read,
    /// Lookup by a secondary key (inventory by product)
    FindBy,
    Create,
    Update,
    /// Partial stock or status update
    Patch,
    Delete,
    /// Inventory low-stock report
    LowStock,
}

impl Action {
    /// Whether the action enumerates records and is subject to owner scoping
    pub fn is_listing(&self) -> bool {
        matches!(self, Action::List | Action::FindBy)
    }
}

/// Check guarding a (resource, action) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Authenticated,
    Admin,
    OwnerOrAdmin,
}

/// The per-resource policy table
pub fn requirement(resource: Resource, action: Action) -> Requirement {
    use Action::*;
    use Requirement::*;

    match (resource, action) {
        (Resource::Supplier, _) => Admin,
        (_, Delete) => Admin,

        (Resource::Product, List | Read | FindBy | LowStock) => Authenticated,
        (Resource::Product, Create | Update | Patch) => Admin,

        (Resource::Inventory | Resource::Order, List | FindBy | Create | LowStock) => Authenticated,
        (Resource::Inventory | Resource::Order, Read | Update | Patch) => OwnerOrAdmin,
    }
}
