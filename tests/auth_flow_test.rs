//! Registration, login, refresh and logout against a real database.

mod common;

use school_api::errors::AppError;
use school_api::domain::UserPatch;
use school_api::services::{AuthService, Authenticator, Registration, UserManager, UserService};

fn registration(username: &str, email: &str) -> Registration {
    Registration {
        username: username.to_string(),
        email: email.to_string(),
        password: "correct-horse-battery".to_string(),
        full_name: "Siti Rahma".to_string(),
    }
}

#[tokio::test]
async fn test_registered_user_gets_default_role() {
    let app = common::seeded().await;
    let auth = Authenticator::new(app.uow.clone(), &app.config);

    let user = auth.register(registration("siti", "siti@example.com")).await.unwrap();

    assert_eq!(user.role_names(), vec!["student"]);
    assert!(user.has_permission("students.read_own"));
    assert!(!user.has_permission("students.read"));
    assert!(!user.has_permission("students.delete"));
}

#[tokio::test]
async fn test_register_without_default_role_is_internal_error() {
    let app = common::empty().await;
    let auth = Authenticator::new(app.uow.clone(), &app.config);

    let err = auth
        .register(registration("siti", "siti@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Internal(_)));
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let app = common::seeded().await;
    let auth = Authenticator::new(app.uow.clone(), &app.config);
    auth.register(registration("siti", "siti@example.com")).await.unwrap();

    let err = auth
        .register(registration("siti", "other@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_login_accepts_username_or_email() {
    let app = common::seeded().await;
    let auth = Authenticator::new(app.uow.clone(), &app.config);
    auth.register(registration("siti", "siti@example.com")).await.unwrap();

    assert!(auth.login("siti", "correct-horse-battery").await.is_ok());
    assert!(auth.login("siti@example.com", "correct-horse-battery").await.is_ok());
    assert!(matches!(
        auth.login("siti", "wrong-password").await.unwrap_err(),
        AppError::InvalidCredentials
    ));
    assert!(matches!(
        auth.login("nobody", "correct-horse-battery").await.unwrap_err(),
        AppError::InvalidCredentials
    ));
}

#[tokio::test]
async fn test_second_login_supersedes_first_token() {
    let app = common::seeded().await;
    let auth = Authenticator::new(app.uow.clone(), &app.config);
    auth.register(registration("siti", "siti@example.com")).await.unwrap();

    let first = auth.login("siti", "correct-horse-battery").await.unwrap();
    let second = auth.login("siti", "correct-horse-battery").await.unwrap();

    assert!(matches!(
        auth.validate(&first.access_token).await.unwrap_err(),
        AppError::TokenRevoked
    ));
    assert!(auth.validate(&second.access_token).await.is_ok());
}

#[tokio::test]
async fn test_refresh_rotates_session() {
    let app = common::seeded().await;
    let auth = Authenticator::new(app.uow.clone(), &app.config);
    auth.register(registration("siti", "siti@example.com")).await.unwrap();

    let login = auth.login("siti", "correct-horse-battery").await.unwrap();
    let refreshed = auth.refresh(&login.refresh_token).await.unwrap();

    assert!(matches!(
        auth.validate(&login.access_token).await.unwrap_err(),
        AppError::TokenRevoked
    ));
    let principal = auth.authenticate(&refreshed.access_token).await.unwrap();
    assert_eq!(principal.username, "siti");
}

#[tokio::test]
async fn test_logout_revokes_access_and_refresh() {
    let app = common::seeded().await;
    let auth = Authenticator::new(app.uow.clone(), &app.config);
    let user = auth.register(registration("siti", "siti@example.com")).await.unwrap();

    let pair = auth.login("siti", "correct-horse-battery").await.unwrap();
    auth.logout(user.id).await.unwrap();

    assert!(matches!(
        auth.validate(&pair.access_token).await.unwrap_err(),
        AppError::TokenRevoked
    ));
    assert!(matches!(
        auth.refresh(&pair.refresh_token).await.unwrap_err(),
        AppError::TokenRevoked
    ));
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let app = common::seeded().await;
    let auth = Authenticator::new(app.uow.clone(), &app.config);
    auth.register(registration("siti", "siti@example.com")).await.unwrap();

    let pair = auth.login("siti", "correct-horse-battery").await.unwrap();

    assert!(matches!(
        auth.validate(&pair.refresh_token).await.unwrap_err(),
        AppError::Unauthorized
    ));
}

#[tokio::test]
async fn test_password_change_revokes_current_token() {
    let app = common::seeded().await;
    let auth = Authenticator::new(app.uow.clone(), &app.config);
    let user = auth.register(registration("siti", "siti@example.com")).await.unwrap();
    let pair = auth.login("siti", "correct-horse-battery").await.unwrap();

    UserManager::new(app.uow.clone())
        .update_user(
            user.id,
            UserPatch {
                password: Some("a-new-long-password".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(matches!(
        auth.validate(&pair.access_token).await.unwrap_err(),
        AppError::TokenRevoked
    ));
    assert!(matches!(
        auth.login("siti", "correct-horse-battery").await.unwrap_err(),
        AppError::InvalidCredentials
    ));
    assert!(auth.login("siti", "a-new-long-password").await.is_ok());
}
