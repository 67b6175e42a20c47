//! Roles, permissions, seeding and academic years against a real database.

mod common;

use chrono::NaiveDate;

use school_api::domain::{NewRole, Perm, RolePatch};
use school_api::errors::AppError;
use school_api::services::{
    AcademicYearManager, AcademicYearService, AdminAccount, AuthService, Authenticator,
    RoleManager, RoleService, Seeder, UserManager, UserService,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn admin() -> AdminAccount {
    AdminAccount {
        username: "admin".to_string(),
        email: "admin@example.com".to_string(),
        password: "admin-password-123".to_string(),
    }
}

#[tokio::test]
async fn test_seeding_twice_creates_nothing_new() {
    let app = common::empty().await;
    let seeder = Seeder::new(app.uow.clone());

    let first = seeder.run(Some(admin())).await.unwrap();
    let second = seeder.run(Some(admin())).await.unwrap();

    assert_eq!(first.permissions_created, Perm::ALL.len());
    assert!(first.admin_created);
    assert_eq!(second.permissions_created, 0);
    assert!(second.roles_created.is_empty());
    assert!(!second.admin_created);
}

#[tokio::test]
async fn test_seeded_admin_holds_every_permission() {
    let app = common::empty().await;
    Seeder::new(app.uow.clone()).run(Some(admin())).await.unwrap();
    let auth = Authenticator::new(app.uow.clone(), &app.config);

    let pair = auth.login("admin", "admin-password-123").await.unwrap();
    let principal = auth.authenticate(&pair.access_token).await.unwrap();

    for perm in Perm::ALL {
        assert!(principal.require(perm).is_ok(), "missing {}", perm);
    }
}

#[tokio::test]
async fn test_only_one_default_role() {
    let app = common::seeded().await;
    let roles = RoleManager::new(app.uow.clone());

    let teacher = roles
        .create_role(NewRole {
            name: "teacher".to_string(),
            description: None,
            is_default: true,
            permission_names: vec!["students.read".to_string(), "parents.read".to_string()],
        })
        .await
        .unwrap();

    let defaults: Vec<String> = roles
        .list_roles()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.is_default)
        .map(|r| r.name)
        .collect();
    assert_eq!(defaults, vec!["teacher"]);

    let err = roles.delete_role(teacher.id).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let student = roles
        .list_roles()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.name == "student")
        .unwrap();
    roles
        .update_role(
            student.id,
            RolePatch {
                is_default: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    roles.delete_role(teacher.id).await.unwrap();
}

#[tokio::test]
async fn test_role_promoted_after_lookup_cannot_be_deleted() {
    let app = common::seeded().await;
    let roles = RoleManager::new(app.uow.clone());
    let clerk = roles
        .create_role(NewRole {
            name: "clerk".to_string(),
            description: None,
            is_default: false,
            permission_names: vec![],
        })
        .await
        .unwrap();
    assert!(!clerk.is_default);

    roles
        .update_role(
            clerk.id,
            RolePatch {
                is_default: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = roles.delete_role(clerk.id).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert!(roles.get_role(clerk.id).await.unwrap().is_default);
}

#[tokio::test]
async fn test_default_role_cannot_be_demoted() {
    let app = common::seeded().await;
    let roles = RoleManager::new(app.uow.clone());
    let student = roles
        .list_roles()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.is_default)
        .unwrap();

    let err = roles
        .update_role(
            student.id,
            RolePatch {
                is_default: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let auth = Authenticator::new(app.uow.clone(), &app.config);
    let user = auth
        .register(school_api::services::Registration {
            username: "rina".to_string(),
            email: "rina@example.com".to_string(),
            password: "rina-password-123".to_string(),
            full_name: "Rina".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(user.role_names(), vec!["student"]);
}

#[tokio::test]
async fn test_unknown_role_delete_is_not_found() {
    let app = common::seeded().await;
    let err = RoleManager::new(app.uow.clone())
        .delete_role(uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("Role")));
}

#[tokio::test]
async fn test_unknown_permission_name_rejected() {
    let app = common::seeded().await;
    let roles = RoleManager::new(app.uow.clone());

    let err = roles
        .create_role(NewRole {
            name: "clerk".to_string(),
            description: None,
            is_default: false,
            permission_names: vec!["students.fly".to_string()],
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)));
    assert!(roles
        .list_roles()
        .await
        .unwrap()
        .iter()
        .all(|r| r.name != "clerk"));
}

#[tokio::test]
async fn test_direct_grant_extends_effective_permissions() {
    let app = common::seeded().await;
    let auth = Authenticator::new(app.uow.clone(), &app.config);
    let users = UserManager::new(app.uow.clone());
    let user = auth
        .register(school_api::services::Registration {
            username: "wali".to_string(),
            email: "wali@example.com".to_string(),
            password: "wali-password-123".to_string(),
            full_name: "Wali Kelas".to_string(),
        })
        .await
        .unwrap();

    users
        .set_permissions(user.id, vec!["parents.read".to_string()])
        .await
        .unwrap();
    let effective = users.effective_permissions(user.id).await.unwrap();

    assert!(effective.allows(Perm::StudentsReadOwn));
    assert!(effective.allows(Perm::ParentsRead));
    assert!(!effective.allows(Perm::StudentsRead));
    assert!(!effective.allows(Perm::ParentsManage));
}

#[tokio::test]
async fn test_activating_year_deactivates_others() {
    let app = common::seeded().await;
    let years = AcademicYearManager::new(app.uow.clone());

    let older = years
        .create_year("2023/2024".to_string(), date(2023, 7, 17), date(2024, 6, 21))
        .await
        .unwrap();
    let newer = years
        .create_year("2024/2025".to_string(), date(2024, 7, 15), date(2025, 6, 20))
        .await
        .unwrap();

    years.activate_year(older.id).await.unwrap();
    let active = years.activate_year(newer.id).await.unwrap();
    assert!(active.is_active);

    let active: Vec<_> = years
        .list_years()
        .await
        .unwrap()
        .into_iter()
        .filter(|y| y.is_active)
        .map(|y| y.id)
        .collect();
    assert_eq!(active, vec![newer.id]);
}

#[tokio::test]
async fn test_duplicate_year_name_conflicts() {
    let app = common::seeded().await;
    let years = AcademicYearManager::new(app.uow.clone());
    years
        .create_year("2024/2025".to_string(), date(2024, 7, 15), date(2025, 6, 20))
        .await
        .unwrap();

    let err = years
        .create_year("2024/2025".to_string(), date(2024, 7, 15), date(2025, 6, 20))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}
