//! Permission registry.
//!
//! Every permission a route can require is a variant here, so a typo in a
//! route declaration is a compile error rather than a silent deny. Roles and
//! direct grants loaded from the database are still plain names; the two
//! meet in `PermissionSet::contains`.

use std::fmt;

/// Closed set of permissions known to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Perm {
    UsersRead,
    UsersManage,
    RolesRead,
    RolesManage,
    StudentsRead,
    StudentsReadOwn,
    StudentsCreate,
    StudentsUpdate,
    StudentsDelete,
    StudentsManageGuardian,
    StudentsManageParents,
    ParentsRead,
    ParentsManage,
    GuardiansRead,
    GuardiansManage,
    EmployeesRead,
    EmployeesManage,
    AcademicYearsRead,
    AcademicYearsManage,
}

impl Perm {
    /// Every registered permission, in seeding order.
    pub const ALL: [Perm; 19] = [
        Perm::UsersRead,
        Perm::UsersManage,
        Perm::RolesRead,
        Perm::RolesManage,
        Perm::StudentsRead,
        Perm::StudentsReadOwn,
        Perm::StudentsCreate,
        Perm::StudentsUpdate,
        Perm::StudentsDelete,
        Perm::StudentsManageGuardian,
        Perm::StudentsManageParents,
        Perm::ParentsRead,
        Perm::ParentsManage,
        Perm::GuardiansRead,
        Perm::GuardiansManage,
        Perm::EmployeesRead,
        Perm::EmployeesManage,
        Perm::AcademicYearsRead,
        Perm::AcademicYearsManage,
    ];

    /// Stored permission name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Perm::UsersRead => "users.read",
            Perm::UsersManage => "users.manage",
            Perm::RolesRead => "roles.read",
            Perm::RolesManage => "roles.manage",
            Perm::StudentsRead => "students.read",
            Perm::StudentsReadOwn => "students.read_own",
            Perm::StudentsCreate => "students.create",
            Perm::StudentsUpdate => "students.update",
            Perm::StudentsDelete => "students.delete",
            Perm::StudentsManageGuardian => "students.manage_guardian",
            Perm::StudentsManageParents => "students.manage_parents",
            Perm::ParentsRead => "parents.read",
            Perm::ParentsManage => "parents.manage",
            Perm::GuardiansRead => "guardians.read",
            Perm::GuardiansManage => "guardians.manage",
            Perm::EmployeesRead => "employees.read",
            Perm::EmployeesManage => "employees.manage",
            Perm::AcademicYearsRead => "academic_years.read",
            Perm::AcademicYearsManage => "academic_years.manage",
        }
    }

    /// Human readable description used when seeding.
    pub const fn description(self) -> &'static str {
        match self {
            Perm::UsersRead => "View user accounts",
            Perm::UsersManage => "Assign roles and permissions, delete user accounts",
            Perm::RolesRead => "View roles and permissions",
            Perm::RolesManage => "Create, update and delete roles and permissions",
            Perm::StudentsRead => "View student records",
            Perm::StudentsReadOwn => "View the student record linked to one's own account",
            Perm::StudentsCreate => "Create student records",
            Perm::StudentsUpdate => "Update student records",
            Perm::StudentsDelete => "Delete student records",
            Perm::StudentsManageGuardian => "Set or remove a student's legal guardian",
            Perm::StudentsManageParents => "Link parents to students",
            Perm::ParentsRead => "View parent records",
            Perm::ParentsManage => "Create, update and delete parent records",
            Perm::GuardiansRead => "View guardian records",
            Perm::GuardiansManage => "Create, update and delete guardian records",
            Perm::EmployeesRead => "View employee records",
            Perm::EmployeesManage => "Create, update and delete employee records",
            Perm::AcademicYearsRead => "View academic years",
            Perm::AcademicYearsManage => "Create, activate and delete academic years",
        }
    }

    /// Look up a registered permission by its stored name.
    pub fn from_name(name: &str) -> Option<Perm> {
        Perm::ALL.into_iter().find(|perm| perm.as_str() == name)
    }
}

impl fmt::Display for Perm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = Perm::ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(names.len(), Perm::ALL.len());
    }

    #[test]
    fn test_from_name_round_trips_registry() {
        for perm in Perm::ALL {
            assert_eq!(Perm::from_name(perm.as_str()), Some(perm));
        }
        assert_eq!(Perm::from_name("students.fly"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Perm::StudentsManageGuardian.to_string(), "students.manage_guardian");
    }
}
