//! Caller identity and write authorization.
//!
//! Authentication happens upstream; the engine only receives the resolved
//! identity and decides whether it may write to a competition.

use piste_core::{AuthorizationError, OrganizationId, PisteResult, Role, UserId};
use serde::{Deserialize, Serialize};

/// Authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub user_id: UserId,
    pub role: Role,
    /// Organization the caller acts for. `None` for platform-wide accounts.
    pub organization_id: Option<OrganizationId>,
}

impl CallerIdentity {
    pub fn new(user_id: UserId, role: Role, organization_id: Option<OrganizationId>) -> Self {
        Self {
            user_id,
            role,
            organization_id,
        }
    }

    pub fn system_admin(user_id: UserId) -> Self {
        Self::new(user_id, Role::SystemAdmin, None)
    }
}

/// Decides whether a caller may modify a competition.
pub trait Authorizer: Send + Sync {
    /// `owner` is the organization owning the competition, or `None` when the
    /// competition could not be resolved.
    fn authorize_write(
        &self,
        caller: &CallerIdentity,
        owner: Option<OrganizationId>,
        action: &str,
    ) -> PisteResult<()>;
}

/// Role-based policy.
///
/// System admins write anywhere. Organization admins and organizers write
/// only inside their own organization. Referees and viewers never write.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAuthorizer;

impl Authorizer for RoleAuthorizer {
    fn authorize_write(
        &self,
        caller: &CallerIdentity,
        owner: Option<OrganizationId>,
        action: &str,
    ) -> PisteResult<()> {
        let deny = |reason: String| -> PisteResult<()> {
            Err(AuthorizationError::PermissionDenied {
                user_id: caller.user_id,
                action: action.to_string(),
                reason,
            }
            .into())
        };

        match caller.role {
            Role::SystemAdmin => Ok(()),
            Role::OrganizationAdmin | Role::Organizer => match (caller.organization_id, owner) {
                (Some(own), Some(target)) if own == target => Ok(()),
                (Some(_), Some(_)) => deny("competition belongs to another organization".to_string()),
                (None, _) => deny(format!("{} has no organization scope", caller.role)),
                (Some(_), None) => deny("competition is outside the caller's organization".to_string()),
            },
            Role::Referee | Role::Viewer => deny(format!("{} may not modify competitions", caller.role)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use piste_core::ErrorKind;

    #[test]
    fn test_system_admin_writes_anywhere() {
        let caller = CallerIdentity::system_admin(UserId::now_v7());
        assert!(RoleAuthorizer
            .authorize_write(&caller, Some(OrganizationId::now_v7()), "generate")
            .is_ok());
        assert!(RoleAuthorizer.authorize_write(&caller, None, "generate").is_ok());
    }

    #[test]
    fn test_organizer_limited_to_own_organization() {
        let org = OrganizationId::now_v7();
        let caller = CallerIdentity::new(UserId::now_v7(), Role::Organizer, Some(org));
        assert!(RoleAuthorizer.authorize_write(&caller, Some(org), "generate").is_ok());

        let err = RoleAuthorizer
            .authorize_write(&caller, Some(OrganizationId::now_v7()), "generate")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn test_read_only_roles_denied() {
        let org = OrganizationId::now_v7();
        for role in [Role::Referee, Role::Viewer] {
            let caller = CallerIdentity::new(UserId::now_v7(), role, Some(org));
            assert!(RoleAuthorizer.authorize_write(&caller, Some(org), "configure_formula").is_err());
        }
    }

    #[test]
    fn test_unresolved_competition_denied_for_scoped_roles() {
        let caller = CallerIdentity::new(
            UserId::now_v7(),
            Role::OrganizationAdmin,
            Some(OrganizationId::now_v7()),
        );
        assert!(RoleAuthorizer.authorize_write(&caller, None, "generate").is_err());
    }
}
