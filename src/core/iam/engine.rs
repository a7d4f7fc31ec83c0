//! Policy decision functions
//!
//! Pure functions with no I/O: callers hand in the principal and, for
//! ownership checks, the owner field of an already-loaded record.
//! Key properties:
//! - 401 (no principal) and 403 (policy denial) stay distinct
//! - Ownership is compared on canonical id strings
//! - Listings of owner-scoped resources are narrowed before the store lookup

use super::policy::{requirement, Action, Principal, Requirement, Resource, Role};
use crate::core::ids::{canonical_id, RecordId};
use std::fmt::Display;
use tracing::debug;

/// Reason a request was denied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// No principal resolved
    Unauthenticated,
    /// Principal resolved but not permitted
    Forbidden(String),
}

/// Outcome of a single policy check
pub type Decision = Result<(), Denial>;

/// Ownership filter applied to a store query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every record regardless of owner
    All,
    /// Only records owned by this principal
    Owner(RecordId),
}

impl Scope {
    /// Whether a record with the given owner falls inside this scope
    pub fn admits(&self, owner: &RecordId) -> bool {
        match self {
            Scope::All => true,
            Scope::Owner(id) => id == owner,
        }
    }
}

/// Deny if no principal was resolved
pub fn require_authenticated(principal: Option<&Principal>) -> Result<&Principal, Denial> {
    principal.ok_or(Denial::Unauthenticated)
}

/// Allow iff the principal is an admin
pub fn require_admin(principal: &Principal) -> Decision {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(Denial::Forbidden("Admin access required".to_string()))
    }
}

/// Allow iff the principal is an admin or owns the record
///
/// `owner_id` may be any representation of an identifier; both sides are
/// reduced to canonical form before comparing.
pub fn require_owner_or_admin(principal: &Principal, owner_id: &dyn Display) -> Decision {
    if principal.is_admin() {
        return Ok(());
    }
    if canonical_id(&owner_id.to_string()) == canonical_id(&principal.id.to_string()) {
        Ok(())
    } else {
        Err(Denial::Forbidden(
            "Not authorized to access this resource".to_string(),
        ))
    }
}

/// Allow iff the principal holds `role` or is an admin
pub fn require_role_or_admin(principal: &Principal, role: Role) -> Decision {
    if principal.role == role || principal.is_admin() {
        Ok(())
    } else {
        Err(Denial::Forbidden(format!("{} access required", role)))
    }
}

/// Ownership filter for a listing of `resource`
///
/// Admins and resources without owners are unfiltered. The low-stock report is
/// not a listing action and so is never narrowed.
pub fn scope_for(principal: &Principal, resource: Resource, action: Action) -> Scope {
    if resource.is_owner_scoped() && action.is_listing() && !principal.is_admin() {
        Scope::Owner(principal.id)
    } else {
        Scope::All
    }
}

/// A granted (resource, action) for a resolved principal
///
/// Returned by [`PolicyEngine::authorize`]. For owner-or-admin actions the grant
/// is provisional until [`Grant::check_owner`] has seen the loaded record.
#[derive(Debug, Clone)]
pub struct Grant {
    principal: Principal,
    resource: Resource,
    action: Action,
    requirement: Requirement,
}

impl Grant {
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Owner filter for store lookups under this grant
    pub fn scope(&self) -> Scope {
        scope_for(&self.principal, self.resource, self.action)
    }

    /// Complete an owner-or-admin check against a loaded record's owner
    pub fn check_owner(&self, owner_id: &dyn Display) -> Decision {
        if self.requirement != Requirement::OwnerOrAdmin {
            return Ok(());
        }
        let decision = require_owner_or_admin(&self.principal, owner_id);
        if decision.is_err() {
            debug!(
                "Denied {:?} on {} owned by {} for principal {}",
                self.action,
                self.resource.label(),
                owner_id,
                self.principal.id
            );
        }
        decision
    }
}

/// Stateless front door to the policy table
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyEngine;

impl PolicyEngine {
    pub fn new() -> Self {
        PolicyEngine
    }

    /// Decide whether `principal` may perform `action` on `resource`
    ///
    /// # Examples
    ///
    /// ```
    /// use stockroom::core::ids::RecordId;
    /// use stockroom::core::iam::{Action, PolicyEngine, Principal, Resource, Role};
    ///
    /// let engine = PolicyEngine::new();
    /// let user = Principal::new(RecordId::new(), "dana", Role::User);
    ///
    /// assert!(engine.authorize(Some(&user), Resource::Product, Action::Read).is_ok());
    /// assert!(engine.authorize(Some(&user), Resource::Product, Action::Create).is_err());
    /// assert!(engine.authorize(None, Resource::Product, Action::Read).is_err());
    /// ```
    pub fn authorize(
        &self,
        principal: Option<&Principal>,
        resource: Resource,
        action: Action,
    ) -> Result<Grant, Denial> {
        let principal = require_authenticated(principal)?;
        let requirement = requirement(resource, action);

        match requirement {
            Requirement::Admin => {
                if let Err(denial) = require_admin(principal) {
                    debug!(
                        "Denied {:?} on {} for non-admin principal {}",
                        action,
                        resource.label(),
                        principal.id
                    );
                    return Err(denial);
                }
            }
            // Ownership is settled once the record is loaded
            Requirement::Authenticated | Requirement::OwnerOrAdmin => {}
        }

        Ok(Grant {
            principal: principal.clone(),
            resource,
            action,
            requirement,
        })
    }
}
