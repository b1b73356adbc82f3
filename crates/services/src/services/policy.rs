//! Resource-level authorization, evaluated uniformly by every service.
//!
//! A caller may act on a resource either because they are one of its direct
//! principals (creator, owner, assignee — whatever the aggregate treats as
//! "theirs") or because their active workspace membership carries a
//! sufficient role. Callers with no active membership fall back to the
//! direct-principal check alone.

use db::models::workspace_member::WorkspaceRole;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRequirement {
    /// Any active member qualifies.
    Member,
    /// Owner or admin.
    Admin,
    /// Owner only.
    Owner,
}

pub fn role_satisfies(role: WorkspaceRole, requirement: RoleRequirement) -> bool {
    match requirement {
        RoleRequirement::Member => true,
        RoleRequirement::Admin => role.is_admin(),
        RoleRequirement::Owner => role == WorkspaceRole::Owner,
    }
}

/// Allow when the caller is one of the resource's direct principals, or when
/// their membership role meets `requirement`.
pub fn can_act(
    user_id: Uuid,
    direct_principals: &[Option<Uuid>],
    membership_role: Option<WorkspaceRole>,
    requirement: RoleRequirement,
) -> bool {
    if direct_principals.iter().flatten().any(|p| *p == user_id) {
        return true;
    }
    membership_role.is_some_and(|role| role_satisfies(role, requirement))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_principal_always_allowed() {
        let user = Uuid::new_v4();
        assert!(can_act(user, &[Some(user)], None, RoleRequirement::Owner));
        assert!(can_act(
            user,
            &[None, Some(user)],
            Some(WorkspaceRole::Member),
            RoleRequirement::Owner
        ));
    }

    #[test]
    fn admin_satisfies_admin_requirement() {
        let user = Uuid::new_v4();
        assert!(can_act(
            user,
            &[Some(Uuid::new_v4())],
            Some(WorkspaceRole::Admin),
            RoleRequirement::Admin
        ));
        assert!(can_act(
            user,
            &[],
            Some(WorkspaceRole::Owner),
            RoleRequirement::Admin
        ));
    }

    #[test]
    fn member_does_not_satisfy_admin_requirement() {
        let user = Uuid::new_v4();
        assert!(!can_act(
            user,
            &[Some(Uuid::new_v4())],
            Some(WorkspaceRole::Member),
            RoleRequirement::Admin
        ));
    }

    #[test]
    fn admin_does_not_satisfy_owner_requirement() {
        let user = Uuid::new_v4();
        assert!(!can_act(
            user,
            &[],
            Some(WorkspaceRole::Admin),
            RoleRequirement::Owner
        ));
    }

    #[test]
    fn no_membership_and_no_principal_denied() {
        let user = Uuid::new_v4();
        assert!(!can_act(
            user,
            &[Some(Uuid::new_v4()), None],
            None,
            RoleRequirement::Member
        ));
    }
}
