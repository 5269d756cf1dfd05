//! Typed wrappers over the backend endpoints
//!
//! Each method builds one request, sends it through the configured
//! [`ApiClient`] and converts the reply into client records.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{ApiClient, ApiRequest, Filter, Part, Query, SortOrder};
use crate::config::SyncConfig;
use crate::contact::ContactId;
use crate::error::ApiError;
use crate::types::{Comment, Genre, Message, Notification, Post, User};
use crate::wire::{
    CommentPayload, GenrePayload, NotificationPayload, Page, PostPayload, PrivateMessagePayload,
    UserPayload,
};

/// List endpoints answer with either a bare array or a paged envelope
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Paged(Page<T>),
    Items(Vec<T>),
}

impl<T> Listing<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Listing::Paged(page) => page.results,
            Listing::Items(items) => items,
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    Ok(serde_json::from_value(value)?)
}

fn decode_list<P, T>(value: Value) -> Result<Vec<T>, ApiError>
where
    P: DeserializeOwned,
    T: From<P>,
{
    let listing: Listing<P> = decode(value)?;
    Ok(listing.into_items().into_iter().map(T::from).collect())
}

#[derive(Clone)]
pub struct Api {
    client: Arc<dyn ApiClient>,
    message_page_size: u32,
    notification_limit: u32,
}

impl Api {
    pub fn new(client: Arc<dyn ApiClient>, sync: &SyncConfig) -> Self {
        Self {
            client,
            message_page_size: sync.message_page_size,
            notification_limit: sync.notification_limit,
        }
    }

    pub fn client(&self) -> &Arc<dyn ApiClient> {
        &self.client
    }

    // ------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------

    pub async fn list_posts(&self) -> Result<Vec<Post>, ApiError> {
        let data = self.client.send(ApiRequest::get("/posts")).await?;
        decode_list::<PostPayload, Post>(data)
    }

    pub async fn get_post(&self, post_id: &str) -> Result<Post, ApiError> {
        let data = self
            .client
            .send(ApiRequest::get(format!("/posts/{post_id}")))
            .await?;
        Ok(Post::from(decode::<PostPayload>(data)?))
    }

    /// Multipart update. The server returns the stored post.
    pub async fn update_post(&self, post_id: &str, parts: Vec<Part>) -> Result<Post, ApiError> {
        let data = self
            .client
            .send(ApiRequest::put_multipart(format!("/posts/{post_id}"), parts))
            .await?;
        Ok(Post::from(decode::<PostPayload>(data)?))
    }

    /// Genres offered when editing a post
    pub async fn list_genres(&self) -> Result<Vec<Genre>, ApiError> {
        let data = self.client.send(ApiRequest::get("/genres")).await?;
        decode_list::<GenrePayload, Genre>(data)
    }

    pub async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, ApiError> {
        let request = ApiRequest::get("/comments")
            .with_query(Query::new().filter(Filter::eq("post_id", post_id)));
        let data = self.client.send(request).await?;
        decode_list::<CommentPayload, Comment>(data)
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Everyone except `me`, used as the chat contact list
    pub async fn list_users_except(&self, me: &str) -> Result<Vec<User>, ApiError> {
        let request =
            ApiRequest::get("/users").with_query(Query::new().filter(Filter::not("_id", me)));
        let data = self.client.send(request).await?;
        decode_list::<UserPayload, User>(data)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, ApiError> {
        let data = self
            .client
            .send(ApiRequest::get(format!("/users/{user_id}")))
            .await?;
        Ok(User::from(decode::<UserPayload>(data)?))
    }

    pub async fn update_profile(&self, user_id: &str, parts: Vec<Part>) -> Result<User, ApiError> {
        let data = self
            .client
            .send(ApiRequest::put_multipart(format!("/users/{user_id}"), parts))
            .await?;
        Ok(User::from(decode::<UserPayload>(data)?))
    }

    // ------------------------------------------------------------------
    // Messenger
    // ------------------------------------------------------------------

    /// Latest page of the conversation, oldest first
    pub async fn list_messages(&self, me: &str, partner: &str) -> Result<Vec<Message>, ApiError> {
        let contact = ContactId::between(me, partner);
        let request = ApiRequest::get("/messages").with_query(
            Query::new()
                .filter(Filter::eq("contact_id", contact.as_str()))
                .sort_by("created_at", SortOrder::Desc)
                .limit(self.message_page_size),
        );
        let data = self.client.send(request).await?;
        let mut messages = decode_list::<PrivateMessagePayload, Message>(data)?;
        messages.reverse();
        debug!(contact = %contact, count = messages.len(), "messages loaded");
        Ok(messages)
    }

    /// Register the conversation on the server before its first message
    pub async fn create_contact(&self, me: &str, partner: &str) -> Result<(), ApiError> {
        let body = json!({
            "contact_id": ContactId::between(me, partner).as_str(),
            "user_id": me,
            "partner_id": partner,
        });
        self.client
            .send(ApiRequest::post("/contacts", body))
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    /// Notifications addressed to `me`
    pub async fn list_notifications(&self, me: &str) -> Result<Vec<Notification>, ApiError> {
        let request = ApiRequest::get("/notifications").with_query(
            Query::new()
                .filter(Filter::eq("opponent_id", me))
                .limit(self.notification_limit),
        );
        let data = self.client.send(request).await?;
        decode_list::<NotificationPayload, Notification>(data)
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        self.client
            .send(ApiRequest::post(
                "/auth/forgot-password",
                json!({ "email": email }),
            ))
            .await?;
        Ok(())
    }

    pub async fn reset_password(&self, email: &str, password: &str) -> Result<(), ApiError> {
        self.client
            .send(ApiRequest::post(
                "/auth/reset-password",
                json!({ "email": email, "password": password }),
            ))
            .await?;
        Ok(())
    }

    pub async fn change_password(
        &self,
        email: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        self.client
            .send(ApiRequest::post(
                "/auth/change-password",
                json!({
                    "email": email,
                    "oldPassword": old_password,
                    "newPassword": new_password,
                }),
            ))
            .await?;
        Ok(())
    }
}
