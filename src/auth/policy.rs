//! Role authorization policy
//!
//! Pure decision functions over the verified request identity. Nothing here
//! touches storage or the request: every function is total over its inputs
//! and only returns a decision, which handlers translate into `403` when
//! denied.

use crate::auth::{Identity, Role};

/// May `requestor` create a user with `desired` role?
///
/// COUNTRY_ADMIN can only mint OPERATOR accounts; escalation to admin or
/// superadmin roles is reserved for SUPERADMIN.
pub fn can_create_user(requestor: &Identity, desired: Role) -> bool {
    match requestor.role {
        Role::Superadmin => true,
        Role::CountryAdmin => desired == Role::Operator,
        Role::Operator => false,
    }
}

/// Country the created user will actually be pinned to.
///
/// A COUNTRY_ADMIN is forcibly pinned to their own country: a request naming
/// a different country is silently corrected, not rejected. SUPERADMIN may
/// assign any country, or none.
pub fn assigned_country(requestor: &Identity, requested: Option<i32>) -> Option<i32> {
    match requestor.role {
        Role::Superadmin => requested,
        Role::CountryAdmin | Role::Operator => requestor.country_id,
    }
}

/// Only SUPERADMIN may change any account's role.
pub fn can_change_role(requestor: &Identity) -> bool {
    requestor.role == Role::Superadmin
}

/// May `requestor` reset the password of an account pinned to
/// `target_country`?
///
/// COUNTRY_ADMIN passes only on strict country equality; a missing country on
/// either side never matches.
pub fn can_change_password(requestor: &Identity, target_country: Option<i32>) -> bool {
    match requestor.role {
        Role::Superadmin => true,
        Role::CountryAdmin => matches!(
            (requestor.country_id, target_country),
            (Some(own), Some(target)) if own == target
        ),
        Role::Operator => false,
    }
}

/// Deletion is gated exactly like creation: SUPERADMIN may remove anyone,
/// COUNTRY_ADMIN only OPERATOR accounts inside their own country.
pub fn can_delete_user(requestor: &Identity, target_role: Role, target_country: Option<i32>) -> bool {
    match requestor.role {
        Role::Superadmin => true,
        Role::CountryAdmin => {
            target_role == Role::Operator && can_change_password(requestor, target_country)
        }
        Role::Operator => false,
    }
}

/// Country records are global reference data; only SUPERADMIN may add them.
pub fn can_manage_countries(requestor: &Identity) -> bool {
    requestor.role == Role::Superadmin
}

#[cfg(test)]
mod tests {
    use super::*;

    fn superadmin() -> Identity {
        Identity {
            id: 1,
            role: Role::Superadmin,
            country_id: None,
        }
    }

    fn country_admin(country_id: i32) -> Identity {
        Identity {
            id: 2,
            role: Role::CountryAdmin,
            country_id: Some(country_id),
        }
    }

    fn operator(country_id: i32) -> Identity {
        Identity {
            id: 3,
            role: Role::Operator,
            country_id: Some(country_id),
        }
    }

    #[test]
    fn superadmin_creates_any_role() {
        for desired in [Role::Superadmin, Role::CountryAdmin, Role::Operator] {
            assert!(can_create_user(&superadmin(), desired));
        }
    }

    #[test]
    fn country_admin_creates_operators_only() {
        let admin = country_admin(4);
        assert!(can_create_user(&admin, Role::Operator));
        assert!(!can_create_user(&admin, Role::CountryAdmin));
        assert!(!can_create_user(&admin, Role::Superadmin));
    }

    #[test]
    fn country_admin_cannot_escalate_regardless_of_country() {
        for country in [1, 2, 99] {
            assert!(!can_create_user(&country_admin(country), Role::Superadmin));
            assert!(can_create_user(&country_admin(country), Role::Operator));
        }
    }

    #[test]
    fn operator_creates_nothing() {
        for desired in [Role::Superadmin, Role::CountryAdmin, Role::Operator] {
            assert!(!can_create_user(&operator(1), desired));
        }
    }

    #[test]
    fn superadmin_assigns_requested_country_or_none() {
        assert_eq!(assigned_country(&superadmin(), Some(5)), Some(5));
        assert_eq!(assigned_country(&superadmin(), None), None);
    }

    #[test]
    fn country_admin_assignment_is_silently_corrected() {
        let admin = country_admin(2);
        // Another country in the request body is overridden, not rejected.
        assert_eq!(assigned_country(&admin, Some(7)), Some(2));
        assert_eq!(assigned_country(&admin, None), Some(2));
    }

    #[test]
    fn only_superadmin_changes_roles() {
        assert!(can_change_role(&superadmin()));
        assert!(!can_change_role(&country_admin(1)));
        assert!(!can_change_role(&operator(1)));
    }

    #[test]
    fn superadmin_changes_any_password() {
        assert!(can_change_password(&superadmin(), Some(3)));
        assert!(can_change_password(&superadmin(), None));
    }

    #[test]
    fn country_admin_changes_passwords_in_own_country_only() {
        let admin = country_admin(3);
        assert!(can_change_password(&admin, Some(3)));
        assert!(!can_change_password(&admin, Some(4)));
    }

    #[test]
    fn missing_country_never_matches() {
        let admin = country_admin(3);
        assert!(!can_change_password(&admin, None));

        let orphaned = Identity {
            id: 9,
            role: Role::CountryAdmin,
            country_id: None,
        };
        assert!(!can_change_password(&orphaned, Some(3)));
        assert!(!can_change_password(&orphaned, None));
    }

    #[test]
    fn operator_changes_no_passwords() {
        assert!(!can_change_password(&operator(1), Some(1)));
    }

    #[test]
    fn deletion_mirrors_creation_rules() {
        assert!(can_delete_user(&superadmin(), Role::CountryAdmin, Some(2)));
        assert!(can_delete_user(&country_admin(2), Role::Operator, Some(2)));
        assert!(!can_delete_user(&country_admin(2), Role::Operator, Some(3)));
        assert!(!can_delete_user(&country_admin(2), Role::CountryAdmin, Some(2)));
        assert!(!can_delete_user(&operator(2), Role::Operator, Some(2)));
    }

    #[test]
    fn only_superadmin_manages_countries() {
        assert!(can_manage_countries(&superadmin()));
        assert!(!can_manage_countries(&country_admin(1)));
        assert!(!can_manage_countries(&operator(1)));
    }
}
