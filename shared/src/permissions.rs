//! Permission Definitions
//!
//! Role-based capability matrix. The table is static data; a check never
//! consults time, network or any other mutable state.
//!
//! ## Rules
//! - Missing identity or unknown role name: no capabilities
//! - Role names are matched case-insensitively
//! - Capabilities are listed per role, not inherited through the role order
//!   (a super administrator oversees users and platform stats, reservation
//!   handling stays with the administrators who own the listings)

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::client::Identity;
use crate::models::Role;

/// Named permission checked against a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    CreateDepartment,
    EditDepartment,
    DeleteDepartment,
    CreateReservation,
    EditReservation,
    DeleteReservation,
    ManageReservations,
    ManageUsers,
    ViewReports,
    ViewSuperAdminStats,
}

impl Capability {
    pub const ALL: [Capability; 10] = [
        Capability::CreateDepartment,
        Capability::EditDepartment,
        Capability::DeleteDepartment,
        Capability::CreateReservation,
        Capability::EditReservation,
        Capability::DeleteReservation,
        Capability::ManageReservations,
        Capability::ManageUsers,
        Capability::ViewReports,
        Capability::ViewSuperAdminStats,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::CreateDepartment => "createDepartment",
            Capability::EditDepartment => "editDepartment",
            Capability::DeleteDepartment => "deleteDepartment",
            Capability::CreateReservation => "createReservation",
            Capability::EditReservation => "editReservation",
            Capability::DeleteReservation => "deleteReservation",
            Capability::ManageReservations => "manageReservations",
            Capability::ManageUsers => "manageUsers",
            Capability::ViewReports => "viewReports",
            Capability::ViewSuperAdminStats => "viewSuperAdminStats",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Regular guest: books and manages own stays
const USER_CAPABILITIES: &[Capability] = &[
    Capability::CreateReservation,
    Capability::EditReservation,
    Capability::DeleteReservation,
];

/// Listing owner / operator
const ADMIN_CAPABILITIES: &[Capability] = &[
    Capability::CreateDepartment,
    Capability::EditDepartment,
    Capability::DeleteDepartment,
    Capability::CreateReservation,
    Capability::EditReservation,
    Capability::DeleteReservation,
    Capability::ManageReservations,
    Capability::ViewReports,
];

/// Platform operator
const SUPERADMIN_CAPABILITIES: &[Capability] = &[
    Capability::CreateDepartment,
    Capability::EditDepartment,
    Capability::DeleteDepartment,
    Capability::CreateReservation,
    Capability::EditReservation,
    Capability::DeleteReservation,
    Capability::ManageUsers,
    Capability::ViewReports,
    Capability::ViewSuperAdminStats,
];

/// Capabilities granted to a role
pub fn capabilities_of(role: Role) -> &'static [Capability] {
    match role {
        Role::User => USER_CAPABILITIES,
        Role::Admin => ADMIN_CAPABILITIES,
        Role::SuperAdmin => SUPERADMIN_CAPABILITIES,
    }
}

/// Check a capability for a known role
pub fn role_can(role: Role, capability: Capability) -> bool {
    capabilities_of(role).contains(&capability)
}

/// Check a capability for a raw role name (fails closed on unknown names)
pub fn role_name_can(role: &str, capability: Capability) -> bool {
    Role::parse(role).is_some_and(|role| role_can(role, capability))
}

/// Check a capability for the current identity (fails closed when absent)
pub fn can(identity: Option<&Identity>, capability: Capability) -> bool {
    identity.is_some_and(|identity| role_name_can(&identity.role, capability))
}

/// Total view of the matrix: every role maps every capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionMatrix(BTreeMap<Role, BTreeMap<Capability, bool>>);

impl PermissionMatrix {
    pub fn build() -> Self {
        let table = Role::ALL
            .into_iter()
            .map(|role| {
                let row = Capability::ALL
                    .into_iter()
                    .map(|cap| (cap, role_can(role, cap)))
                    .collect();
                (role, row)
            })
            .collect();
        Self(table)
    }

    /// Lookup by raw role name; unknown roles yield `false`
    pub fn get(&self, role: &str, capability: Capability) -> bool {
        Role::parse(role)
            .and_then(|role| self.0.get(&role))
            .and_then(|row| row.get(&capability))
            .copied()
            .unwrap_or(false)
    }

    pub fn row(&self, role: Role) -> Option<&BTreeMap<Capability, bool>> {
        self.0.get(&role)
    }
}

macro_rules! capability_predicates {
    ($($name:ident => $cap:ident),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(identity: Option<&Identity>) -> bool {
                can(identity, Capability::$cap)
            }
        )*
    };
}

capability_predicates! {
    can_create_department => CreateDepartment,
    can_edit_department => EditDepartment,
    can_delete_department => DeleteDepartment,
    can_create_reservation => CreateReservation,
    can_edit_reservation => EditReservation,
    can_delete_reservation => DeleteReservation,
    can_manage_reservations => ManageReservations,
    can_manage_users => ManageUsers,
    can_view_reports => ViewReports,
    can_view_super_admin_stats => ViewSuperAdminStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityId;

    fn identity(role: &str) -> Identity {
        Identity {
            id: EntityId::from(1),
            name: "Test".into(),
            email: "t@example.com".into(),
            role: role.into(),
            phone: None,
            gender: None,
            bio: None,
        }
    }

    #[test]
    fn test_matrix_is_total() {
        let matrix = PermissionMatrix::build();
        for role in Role::ALL {
            let row = matrix.row(role).unwrap();
            assert_eq!(row.len(), Capability::ALL.len());
        }
    }

    #[test]
    fn test_unknown_role_has_nothing() {
        for cap in Capability::ALL {
            assert!(!role_name_can("owner", cap));
            assert!(!can(Some(&identity("guest")), cap));
            assert!(!PermissionMatrix::build().get("owner", cap));
        }
    }

    #[test]
    fn test_anonymous_has_nothing() {
        for cap in Capability::ALL {
            assert!(!can(None, cap));
        }
    }

    #[test]
    fn test_case_insensitive_role() {
        assert!(can(Some(&identity("ADMIN")), Capability::DeleteDepartment));
        assert!(can(Some(&identity("SuperAdmin")), Capability::ManageUsers));
    }

    #[test]
    fn test_user_cannot_touch_listings() {
        let user = identity("user");
        assert!(!can_delete_department(Some(&user)));
        assert!(!can_create_department(Some(&user)));
        assert!(can_create_reservation(Some(&user)));
    }

    #[test]
    fn test_manage_reservations_not_inherited() {
        assert!(role_can(Role::Admin, Capability::ManageReservations));
        assert!(!role_can(Role::SuperAdmin, Capability::ManageReservations));
    }

    #[test]
    fn test_only_superadmin_sees_platform_stats() {
        assert!(!can_view_super_admin_stats(Some(&identity("admin"))));
        assert!(can_view_super_admin_stats(Some(&identity("superadmin"))));
        assert!(!can_manage_users(Some(&identity("admin"))));
    }

    #[test]
    fn test_matrix_agrees_with_can() {
        let matrix = PermissionMatrix::build();
        for role in Role::ALL {
            for cap in Capability::ALL {
                assert_eq!(matrix.get(role.as_str(), cap), role_can(role, cap));
            }
        }
    }

    #[test]
    fn test_capability_names() {
        assert_eq!(
            serde_json::to_string(&Capability::ViewSuperAdminStats).unwrap(),
            "\"viewSuperAdminStats\""
        );
        assert_eq!(Capability::ManageUsers.to_string(), "manageUsers");
    }
}
