//! Account flows: password recovery, password change, profile edit

use secrecy::ExposeSecret;
use tracing::info;

use super::validation::{ChangePasswordForm, ForgotPasswordForm, ProfileForm, ResetPasswordForm};
use crate::api::Api;
use crate::error::{Result, TunecastError};
use crate::kv::{KeyValueStore, RETRIEVE_PASSWORD_EMAIL};
use crate::store::{Action, Store};
use crate::types::{User, UserPatch};

#[derive(Clone)]
pub struct AccountService {
    api: Api,
    kv: KeyValueStore,
    store: Store,
}

impl AccountService {
    pub fn new(api: Api, kv: KeyValueStore, store: Store) -> Self {
        Self { api, kv, store }
    }

    /// Request a reset email and remember the address for the reset step
    pub async fn forgot_password(&self, form: &ForgotPasswordForm) -> Result<()> {
        form.validate()?;
        let email = form.email.trim();

        self.api.forgot_password(email).await?;
        self.kv.set(RETRIEVE_PASSWORD_EMAIL, email).await?;
        info!("password reset requested");
        Ok(())
    }

    /// Email waiting for a reset, if a recovery is in progress
    pub async fn pending_reset_email(&self) -> Result<Option<String>> {
        self.kv.get(RETRIEVE_PASSWORD_EMAIL).await
    }

    /// Set a new password for the address stored by [`Self::forgot_password`]
    pub async fn reset_password(&self, form: &ResetPasswordForm) -> Result<()> {
        form.validate()?;
        let email = self.pending_reset_email().await?.ok_or_else(|| {
            TunecastError::InvalidInput("no password recovery in progress".to_string())
        })?;

        self.api
            .reset_password(&email, form.password.expose_secret().trim())
            .await?;
        self.kv.remove(RETRIEVE_PASSWORD_EMAIL).await?;
        info!("password reset");
        Ok(())
    }

    pub async fn change_password(&self, form: &ChangePasswordForm) -> Result<()> {
        form.validate()?;
        let email = self
            .store
            .select(|s| s.user.logged_in_user.as_ref().map(|u| u.email.clone()))
            .ok_or_else(|| TunecastError::InvalidInput("no logged-in user".to_string()))?;

        self.api
            .change_password(
                &email,
                form.old_password.expose_secret(),
                form.new_password.expose_secret(),
            )
            .await?;
        Ok(())
    }

    /// Upload the profile and merge the stored record into the logged-in user
    pub async fn update_profile(&self, user_id: &str, form: &ProfileForm) -> Result<User> {
        form.validate()?;
        let user = self.api.update_profile(user_id, form.to_parts()).await?;
        self.store
            .dispatch(Action::UpdateUser(UserPatch::from(user.clone())));
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Body, Method, MockApiClient};
    use crate::config::SyncConfig;
    use serde_json::json;
    use std::sync::Arc;

    async fn service() -> (AccountService, Arc<MockApiClient>, Store) {
        let mock = Arc::new(MockApiClient::new());
        let api = Api::new(mock.clone(), &SyncConfig::default());
        let kv = KeyValueStore::in_memory().await.unwrap();
        let store = Store::new();
        (AccountService::new(api, kv, store.clone()), mock, store)
    }

    #[tokio::test]
    async fn test_recovery_round() {
        let (service, mock, _) = service().await;
        mock.respond(Method::Post, "/auth/forgot-password", json!(null));
        mock.respond(Method::Post, "/auth/reset-password", json!(null));

        service
            .forgot_password(&ForgotPasswordForm {
                email: " amy@example.com".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(
            service.pending_reset_email().await.unwrap().as_deref(),
            Some("amy@example.com")
        );

        service
            .reset_password(&ResetPasswordForm::new("secret123", "secret123"))
            .await
            .unwrap();

        let request = &mock.requests_to(Method::Post, "/auth/reset-password")[0];
        assert_eq!(
            request.body,
            Body::Json(json!({"email": "amy@example.com", "password": "secret123"}))
        );
        assert_eq!(service.pending_reset_email().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejected_forgot_password_stores_nothing() {
        let (service, mock, _) = service().await;
        mock.reject(Method::Post, "/auth/forgot-password", "Email not found");

        let err = service
            .forgot_password(&ForgotPasswordForm {
                email: "amy@example.com".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.banner_message(), "Email not found");
        assert_eq!(service.pending_reset_email().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_form_sends_nothing() {
        let (service, mock, _) = service().await;
        let err = service
            .forgot_password(&ForgotPasswordForm {
                email: "nope".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TunecastError::Validation(_)));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_reset_without_recovery() {
        let (service, mock, _) = service().await;
        let err = service
            .reset_password(&ResetPasswordForm::new("secret123", "secret123"))
            .await
            .unwrap_err();
        assert!(matches!(err, TunecastError::InvalidInput(_)));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_update_profile_merges_user() {
        let (service, mock, store) = service().await;
        store.dispatch(Action::SetUser(User {
            id: "u1".to_string(),
            email: "old@example.com".to_string(),
            followers: 4,
            ..Default::default()
        }));
        mock.respond(
            Method::Put,
            "/users/u1",
            json!({"_id": "u1", "email": "new@example.com", "bio": "hi", "num_followers": 4}),
        );

        let form = ProfileForm {
            email: "new@example.com".to_string(),
            bio: "hi".to_string(),
            ..Default::default()
        };
        service.update_profile("u1", &form).await.unwrap();

        let me = store.snapshot().user.logged_in_user.unwrap();
        assert_eq!(me.email, "new@example.com");
        assert_eq!(me.bio.as_deref(), Some("hi"));
        assert_eq!(me.followers, 4);
    }
}
