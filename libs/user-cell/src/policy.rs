// libs/user-cell/src/policy.rs
//! Who may see and edit which user records. Everything here is pure so the
//! rules can be tested without a store.

use serde::Serialize;

use shared_models::auth::{Actor, UserLevel};

use crate::models::{AdminUpdateUserRequest, UserError, UserProfile};

/// Fields an actor may edit on a given target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldPolicy {
    pub user_level_editable: bool,
    pub allowed_levels: Vec<UserLevel>,
    pub is_active_editable: bool,
    pub flags_editable: bool,
}

impl FieldPolicy {
    fn read_only() -> Self {
        Self {
            user_level_editable: false,
            allowed_levels: Vec::new(),
            is_active_editable: false,
            flags_editable: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StaffFlags {
    pub is_staff: bool,
    pub is_superuser: bool,
}

pub fn derive_flags(level: UserLevel) -> StaffFlags {
    StaffFlags {
        is_staff: level.is_staff(),
        is_superuser: level == UserLevel::Superuser,
    }
}

pub fn user_field_policy(actor: &Actor, target: &UserProfile) -> FieldPolicy {
    if !actor.is_staff() {
        return FieldPolicy::read_only();
    }

    let allowed_levels = if actor.is_superuser() {
        vec![UserLevel::Patient, UserLevel::Doctor, UserLevel::Admin]
    } else {
        vec![UserLevel::Patient, UserLevel::Doctor]
    };

    let editing_self = actor.id == target.id;
    let user_level_editable = target.user_level != UserLevel::Superuser
        && !(editing_self && !actor.is_superuser());

    FieldPolicy {
        user_level_editable,
        allowed_levels: if user_level_editable { allowed_levels } else { Vec::new() },
        is_active_editable: target.user_level == UserLevel::Doctor,
        flags_editable: actor.is_superuser(),
    }
}

/// Levels whose rows the actor may list.
pub fn visible_levels(actor: &Actor) -> Vec<UserLevel> {
    match actor.level {
        UserLevel::Superuser => vec![UserLevel::Patient, UserLevel::Doctor, UserLevel::Admin],
        UserLevel::Admin => vec![UserLevel::Patient, UserLevel::Doctor],
        UserLevel::Doctor | UserLevel::Patient => Vec::new(),
    }
}

pub fn can_change(actor: &Actor, target_level: UserLevel) -> bool {
    if actor.is_superuser() {
        return true;
    }
    actor.is_staff() && !target_level.is_staff()
}

pub fn can_delete(actor: &Actor, target_level: UserLevel) -> bool {
    can_change(actor, target_level)
}

/// Rejects any field in `request` that `policy` does not open. Values equal
/// to the stored ones are not edits.
pub fn check_update(
    policy: &FieldPolicy,
    target: &UserProfile,
    request: &AdminUpdateUserRequest,
) -> Result<(), UserError> {
    if let Some(level) = request.user_level.filter(|level| *level != target.user_level) {
        if !policy.user_level_editable {
            return Err(UserError::Forbidden("user_level cannot be changed for this user".to_string()));
        }
        if !policy.allowed_levels.contains(&level) {
            return Err(UserError::Forbidden(format!("You cannot assign the {} level", level)));
        }
    }

    if request.is_active.is_some_and(|active| active != target.is_active) && !policy.is_active_editable {
        return Err(UserError::Forbidden("is_active can only be changed for doctors".to_string()));
    }

    if request.is_staff.is_some() || request.is_superuser.is_some() {
        if !policy.flags_editable {
            return Err(UserError::Forbidden("Only superusers can set staff flags".to_string()));
        }
        let expected = derive_flags(request.user_level.unwrap_or(target.user_level));
        let consistent = request.is_staff.map_or(true, |v| v == expected.is_staff)
            && request.is_superuser.map_or(true, |v| v == expected.is_superuser);
        if !consistent {
            return Err(UserError::Validation("Staff flags must follow user_level".to_string()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use uuid::Uuid;

    fn profile(level: UserLevel) -> UserProfile {
        let flags = derive_flags(level);
        UserProfile {
            id: Uuid::new_v4(),
            username: "someone".to_string(),
            first_name: "Some".to_string(),
            last_name: "One".to_string(),
            email: "someone@example.com".to_string(),
            phone: "+10000000001".to_string(),
            user_level: level,
            is_active: true,
            is_staff: flags.is_staff,
            is_superuser: flags.is_superuser,
        }
    }

    fn actor(level: UserLevel) -> Actor {
        Actor::new(Uuid::new_v4(), level)
    }

    #[test]
    fn test_admin_assigns_only_patient_or_doctor() {
        let policy = user_field_policy(&actor(UserLevel::Admin), &profile(UserLevel::Patient));
        assert!(policy.user_level_editable);
        assert_eq!(policy.allowed_levels, vec![UserLevel::Patient, UserLevel::Doctor]);
        assert!(!policy.flags_editable);
        assert!(!policy.is_active_editable);
    }

    #[test]
    fn test_superuser_assigns_anything_but_superuser() {
        let policy = user_field_policy(&actor(UserLevel::Superuser), &profile(UserLevel::Doctor));
        assert!(policy.allowed_levels.contains(&UserLevel::Admin));
        assert!(!policy.allowed_levels.contains(&UserLevel::Superuser));
        assert!(policy.flags_editable);
        assert!(policy.is_active_editable);
    }

    #[test]
    fn test_superuser_target_level_is_locked() {
        let policy = user_field_policy(&actor(UserLevel::Superuser), &profile(UserLevel::Superuser));
        assert!(!policy.user_level_editable);
        assert!(policy.allowed_levels.is_empty());
    }

    #[test]
    fn test_admin_cannot_change_own_level() {
        let admin = actor(UserLevel::Admin);
        let mut own = profile(UserLevel::Admin);
        own.id = admin.id;
        assert!(!user_field_policy(&admin, &own).user_level_editable);
    }

    #[test]
    fn test_non_staff_get_read_only_policy() {
        let policy = user_field_policy(&actor(UserLevel::Doctor), &profile(UserLevel::Patient));
        assert_eq!(policy, FieldPolicy::read_only());
    }

    #[test]
    fn test_visibility_and_permissions() {
        assert!(visible_levels(&actor(UserLevel::Admin)).iter().all(|l| !l.is_staff()));
        assert!(!visible_levels(&actor(UserLevel::Superuser)).contains(&UserLevel::Superuser));
        assert!(visible_levels(&actor(UserLevel::Patient)).is_empty());

        let admin = actor(UserLevel::Admin);
        assert!(can_change(&admin, UserLevel::Doctor));
        assert!(!can_change(&admin, UserLevel::Admin));
        assert!(!can_delete(&admin, UserLevel::Superuser));
        assert!(can_delete(&actor(UserLevel::Superuser), UserLevel::Superuser));
        assert!(!can_change(&actor(UserLevel::Doctor), UserLevel::Patient));
    }

    #[test]
    fn test_flags_follow_level() {
        assert_eq!(derive_flags(UserLevel::Superuser), StaffFlags { is_staff: true, is_superuser: true });
        assert_eq!(derive_flags(UserLevel::Admin), StaffFlags { is_staff: true, is_superuser: false });
        assert_eq!(derive_flags(UserLevel::Doctor), StaffFlags { is_staff: false, is_superuser: false });
    }

    #[test]
    fn test_check_update_rejects_closed_fields() {
        let admin = actor(UserLevel::Admin);
        let target = profile(UserLevel::Patient);
        let policy = user_field_policy(&admin, &target);

        let promote = AdminUpdateUserRequest { user_level: Some(UserLevel::Admin), ..Default::default() };
        assert_matches!(check_update(&policy, &target, &promote), Err(UserError::Forbidden(_)));

        let deactivate = AdminUpdateUserRequest { is_active: Some(false), ..Default::default() };
        assert_matches!(check_update(&policy, &target, &deactivate), Err(UserError::Forbidden(_)));

        let unchanged = AdminUpdateUserRequest { user_level: Some(UserLevel::Patient), is_active: Some(true), ..Default::default() };
        assert!(check_update(&policy, &target, &unchanged).is_ok());

        let flags = AdminUpdateUserRequest { is_staff: Some(true), ..Default::default() };
        assert_matches!(check_update(&policy, &target, &flags), Err(UserError::Forbidden(_)));
    }

    #[test]
    fn test_superuser_flags_must_match_level() {
        let root = actor(UserLevel::Superuser);
        let target = profile(UserLevel::Doctor);
        let policy = user_field_policy(&root, &target);

        let consistent = AdminUpdateUserRequest {
            user_level: Some(UserLevel::Admin),
            is_staff: Some(true),
            ..Default::default()
        };
        assert!(check_update(&policy, &target, &consistent).is_ok());

        let inconsistent = AdminUpdateUserRequest { is_superuser: Some(true), ..Default::default() };
        assert_matches!(check_update(&policy, &target, &inconsistent), Err(UserError::Validation(_)));
    }
}
