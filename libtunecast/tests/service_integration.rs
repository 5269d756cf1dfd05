//! Service layer integration tests
//!
//! Exercise `TunecastService` built from a config file on disk, with a
//! file-backed key-value store and a mock backend.

use std::fs;
use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use tempfile::TempDir;

use libtunecast::api::{Method, MockApiClient};
use libtunecast::service::validation::{
    ChangePasswordForm, ForgotPasswordForm, PostForm, ResetPasswordForm,
};
use libtunecast::service::TunecastService;
use libtunecast::{Action, Config, KeyValueStore, TunecastError, User};

fn write_config(temp_dir: &TempDir) -> Result<Config> {
    let data_dir = temp_dir.path().join("data");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            r#"
[api]
base_url = "http://127.0.0.1:9/v1"

[socket]
url = "ws://127.0.0.1:9"

[storage]
data_dir = "{data}"
kv_path = "{data}/kv.db"

[sync]
message_page_size = 20
"#,
            data = data_dir.display().to_string().replace('\\', "/")
        ),
    )?;
    Ok(Config::load_from_path(&config_path)?)
}

async fn mocked(temp_dir: &TempDir) -> Result<(TunecastService, Arc<MockApiClient>)> {
    let config = write_config(temp_dir)?;
    let kv = KeyValueStore::new(config.kv_path().to_str().unwrap()).await?;
    let mock = Arc::new(MockApiClient::new());
    Ok((TunecastService::with_parts(config, mock.clone(), kv), mock))
}

#[tokio::test]
async fn test_from_config_creates_storage() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = write_config(&temp_dir)?;
    let kv_path = config.kv_path();

    let service = TunecastService::from_config(config).await?;
    assert!(kv_path.exists());
    assert_eq!(service.config().sync.message_page_size, 20);

    let folders = service.bootstrap()?;
    for dir in folders.all() {
        assert!(dir.is_dir());
    }
    Ok(())
}

#[tokio::test]
async fn test_password_recovery_survives_restart() -> Result<()> {
    let temp_dir = TempDir::new()?;

    {
        let (service, mock) = mocked(&temp_dir).await?;
        mock.respond(Method::Post, "/auth/forgot-password", json!(null));
        service
            .account()
            .forgot_password(&ForgotPasswordForm {
                email: "amy@example.com".to_string(),
            })
            .await?;
    }

    // A fresh service over the same files picks the recovery back up.
    let (service, mock) = mocked(&temp_dir).await?;
    mock.respond(Method::Post, "/auth/reset-password", json!(null));
    assert_eq!(
        service.account().pending_reset_email().await?.as_deref(),
        Some("amy@example.com")
    );

    service
        .account()
        .reset_password(&ResetPasswordForm::new("newpass123", "newpass123"))
        .await?;
    assert_eq!(service.account().pending_reset_email().await?, None);
    Ok(())
}

#[tokio::test]
async fn test_failed_reset_keeps_stashed_email() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (service, mock) = mocked(&temp_dir).await?;
    mock.respond(Method::Post, "/auth/forgot-password", json!(null));
    mock.fail(
        Method::Post,
        "/auth/reset-password",
        400,
        Some("Link expired"),
    );

    service
        .account()
        .forgot_password(&ForgotPasswordForm {
            email: "amy@example.com".to_string(),
        })
        .await?;

    let err = service
        .account()
        .reset_password(&ResetPasswordForm::new("newpass123", "newpass123"))
        .await
        .unwrap_err();
    assert_eq!(err.banner_message(), "Link expired");
    assert!(service.account().pending_reset_email().await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_change_password_needs_login() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (service, mock) = mocked(&temp_dir).await?;
    mock.respond(Method::Post, "/auth/change-password", json!(null));
    let form = ChangePasswordForm::new("oldpass123", "newpass123", "newpass123");

    let err = service.account().change_password(&form).await.unwrap_err();
    assert!(matches!(err, TunecastError::InvalidInput(_)));
    assert_eq!(err.exit_code(), 3);

    service.store().dispatch(Action::SetUser(User {
        id: "u1".to_string(),
        email: "amy@example.com".to_string(),
        ..Default::default()
    }));
    service.account().change_password(&form).await?;

    let request = &mock.requests_to(Method::Post, "/auth/change-password")[0];
    assert_eq!(
        request.body,
        libtunecast::api::Body::Json(json!({
            "email": "amy@example.com",
            "oldPassword": "oldpass123",
            "newPassword": "newpass123"
        }))
    );
    Ok(())
}

#[tokio::test]
async fn test_unauthorized_exit_code() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (service, mock) = mocked(&temp_dir).await?;
    mock.fail(Method::Put, "/posts/p1", 401, None);

    let form = PostForm {
        title: "Loop".to_string(),
        genre_id: "g1".to_string(),
        ..Default::default()
    };
    let err = service.posts().update_post("p1", &form).await.unwrap_err();
    assert_eq!(err.exit_code(), 2);
    Ok(())
}
