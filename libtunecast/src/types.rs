//! Client-side records held by the store
//!
//! Field names serialize in camelCase, the client-side convention. Each
//! record has a patch type whose fields are all optional; applying a patch
//! copies every present field onto the record (shallow merge).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::entity::{Entity, Patch};

// ============================================================================
// User
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    /// Reference to the avatar file on the server
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub following: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub followers: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub following: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers: Option<u64>,
}

impl From<User> for UserPatch {
    /// A patch carrying every field of `user`, used when the server returns
    /// the full updated record.
    fn from(user: User) -> Self {
        Self {
            email: Some(user.email),
            username: Some(user.username),
            bio: user.bio,
            avatar: user.avatar,
            phone: user.phone,
            address: user.address,
            birthday: user.birthday,
            sex: user.sex,
            following: Some(user.following),
            followers: Some(user.followers),
        }
    }
}

impl Patch<User> for UserPatch {
    fn apply(self, user: &mut User) {
        merge(&mut user.email, self.email);
        merge(&mut user.username, self.username);
        merge_opt(&mut user.bio, self.bio);
        merge_opt(&mut user.avatar, self.avatar);
        merge_opt(&mut user.phone, self.phone);
        merge_opt(&mut user.address, self.address);
        merge_opt(&mut user.birthday, self.birthday);
        merge_opt(&mut user.sex, self.sex);
        merge(&mut user.following, self.following);
        merge(&mut user.followers, self.followers);
    }
}

impl Entity for User {
    type Patch = UserPatch;

    fn id(&self) -> &str {
        &self.id
    }
}

// ============================================================================
// Post
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sound: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub genre_id: Option<String>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub listens: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
}

impl From<Post> for PostPatch {
    fn from(post: Post) -> Self {
        Self {
            title: Some(post.title),
            sound: post.sound,
            thumbnail: post.thumbnail,
            genre_id: post.genre_id,
            likes: Some(post.likes),
            listens: Some(post.listens),
            comments: Some(post.comments),
        }
    }
}

impl Patch<Post> for PostPatch {
    fn apply(self, post: &mut Post) {
        merge(&mut post.title, self.title);
        merge_opt(&mut post.sound, self.sound);
        merge_opt(&mut post.thumbnail, self.thumbnail);
        merge_opt(&mut post.genre_id, self.genre_id);
        merge(&mut post.likes, self.likes);
        merge(&mut post.listens, self.listens);
        merge(&mut post.comments, self.comments);
    }
}

impl Entity for Post {
    type Patch = PostPatch;

    fn id(&self) -> &str {
        &self.id
    }
}

// ============================================================================
// Genre
// ============================================================================

/// A genre a post can be filed under
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: String,
    pub name: String,
}

// ============================================================================
// Comment
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Patch<Comment> for CommentPatch {
    fn apply(self, comment: &mut Comment) {
        merge(&mut comment.content, self.content);
    }
}

impl Entity for Comment {
    type Patch = CommentPatch;

    fn id(&self) -> &str {
        &self.id
    }
}

// ============================================================================
// Message
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_id: String,
    /// Conversation bucket, see [`crate::contact::ContactId`]
    pub contact_id: String,
    pub from: String,
    pub to: String,
    pub content: String,
    #[serde(default)]
    pub is_unread_at_to: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_unread_at_to: Option<bool>,
}

impl Patch<Message> for MessagePatch {
    fn apply(self, message: &mut Message) {
        merge(&mut message.content, self.content);
        merge(&mut message.is_unread_at_to, self.is_unread_at_to);
    }
}

impl Entity for Message {
    type Patch = MessagePatch;

    fn id(&self) -> &str {
        &self.message_id
    }
}

// ============================================================================
// Notification
// ============================================================================

/// What the actor did to the recipient's post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationAction {
    Liked,
    Listened,
    Bookmarked,
    #[serde(other)]
    Other,
}

impl NotificationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Liked => "Liked",
            Self::Listened => "Listened",
            Self::Bookmarked => "Bookmarked",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for NotificationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    /// The actor
    pub user_id: String,
    /// The recipient
    pub opponent_id: String,
    pub action: NotificationAction,
    #[serde(default)]
    pub source_post_id: Option<String>,
    #[serde(default)]
    pub is_unread: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_unread: Option<bool>,
}

impl NotificationPatch {
    pub fn read() -> Self {
        Self {
            is_unread: Some(false),
        }
    }
}

impl Patch<Notification> for NotificationPatch {
    fn apply(self, notification: &mut Notification) {
        merge(&mut notification.is_unread, self.is_unread);
    }
}

impl Entity for Notification {
    type Patch = NotificationPatch;

    fn id(&self) -> &str {
        &self.id
    }
}

fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn merge_opt<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Deserializers tolerant of the server's loose typing
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
        Null(()),
    }

    /// Accept `12`, `"12"` or `null` (as 0).
    pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Count::deserialize(deserializer)? {
            Count::Number(n) => Ok(n),
            Count::Null(()) => Ok(0),
            Count::Text(s) if s.trim().is_empty() => Ok(0),
            Count::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_counts_accept_strings() {
        let user: User = serde_json::from_str(
            r#"{"id":"u1","email":"a@b.c","username":"ann","following":"3","followers":7}"#,
        )
        .unwrap();
        assert_eq!(user.following, 3);
        assert_eq!(user.followers, 7);
    }

    #[test]
    fn test_user_counts_reject_garbage() {
        let result: Result<User, _> =
            serde_json::from_str(r#"{"id":"u1","following":"many"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_only_touches_present_fields() {
        let mut post = Post {
            id: "p1".to_string(),
            title: "Night drive".to_string(),
            likes: 3,
            listens: 10,
            ..Default::default()
        };

        PostPatch {
            likes: Some(42),
            ..Default::default()
        }
        .apply(&mut post);

        assert_eq!(post.likes, 42);
        assert_eq!(post.listens, 10);
        assert_eq!(post.title, "Night drive");
    }

    #[test]
    fn test_user_patch_from_full_record() {
        let mut user = User {
            id: "u1".to_string(),
            bio: Some("old".to_string()),
            ..Default::default()
        };
        let updated = User {
            id: "u1".to_string(),
            email: "new@example.com".to_string(),
            bio: Some("new".to_string()),
            followers: 9,
            ..Default::default()
        };

        UserPatch::from(updated).apply(&mut user);

        assert_eq!(user.email, "new@example.com");
        assert_eq!(user.bio.as_deref(), Some("new"));
        assert_eq!(user.followers, 9);
    }

    #[test]
    fn test_unknown_notification_action() {
        let action: NotificationAction = serde_json::from_str(r#""Shared""#).unwrap();
        assert_eq!(action, NotificationAction::Other);
    }

    #[test]
    fn test_notification_read_patch() {
        let mut notification = Notification {
            id: "n1".to_string(),
            user_id: "u2".to_string(),
            opponent_id: "u1".to_string(),
            action: NotificationAction::Liked,
            source_post_id: Some("p1".to_string()),
            is_unread: true,
            created_at: None,
        };
        NotificationPatch::read().apply(&mut notification);
        assert!(!notification.is_unread);
    }
}
