//! Server-side shapes and their mapping onto client records
//!
//! The backend names fields in snake_case. Each payload struct here mirrors
//! one server shape, and its `From` impl is the complete rename table into
//! the client record. Counter payloads also accept the camelCase names some
//! endpoints already send.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::contact::ContactId;
use crate::types::{
    Comment, Genre, Message, Notification, NotificationAction, Post, PostPatch, User, UserPatch,
};

/// `messenger:send_private_message` push, also the REST message record
#[derive(Debug, Clone, Deserialize)]
pub struct PrivateMessagePayload {
    #[serde(alias = "messageId")]
    pub message_id: String,
    #[serde(default, alias = "contactId")]
    pub contact_id: Option<String>,
    pub content: String,
    pub from: String,
    pub to: String,
    #[serde(default, alias = "isUnreadAtTo")]
    pub is_unread_at_to: bool,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<PrivateMessagePayload> for Message {
    fn from(p: PrivateMessagePayload) -> Self {
        // Older servers omit contact_id; derive it the same way senders do.
        let contact_id = p
            .contact_id
            .unwrap_or_else(|| ContactId::between(&p.from, &p.to).into_string());
        Message {
            message_id: p.message_id,
            contact_id,
            from: p.from,
            to: p.to,
            content: p.content,
            is_unread_at_to: p.is_unread_at_to,
            created_at: p.created_at,
        }
    }
}

/// `notification:send_notification` push, also the REST notification record
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationPayload {
    pub id: String,
    #[serde(alias = "userId")]
    pub user_id: String,
    #[serde(alias = "opponentId")]
    pub opponent_id: String,
    #[serde(default, alias = "sourcePostId")]
    pub source_post_id: Option<String>,
    pub action: NotificationAction,
    #[serde(default, alias = "isUnread")]
    pub is_unread: bool,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<NotificationPayload> for Notification {
    fn from(p: NotificationPayload) -> Self {
        Notification {
            id: p.id,
            user_id: p.user_id,
            opponent_id: p.opponent_id,
            action: p.action,
            source_post_id: p.source_post_id,
            is_unread: p.is_unread,
            created_at: p.created_at,
        }
    }
}

/// `post:num_like` / `post:num_listening`: a post id plus counter fields
#[derive(Debug, Clone, Deserialize)]
pub struct PostCounterPayload {
    #[serde(rename = "postId", alias = "post_id")]
    pub post_id: String,
    #[serde(default, alias = "num_like")]
    pub likes: Option<u64>,
    #[serde(default, alias = "num_listening")]
    pub listens: Option<u64>,
    #[serde(default, alias = "num_comment")]
    pub comments: Option<u64>,
}

impl PostCounterPayload {
    pub fn into_update(self) -> (String, PostPatch) {
        let patch = PostPatch {
            likes: self.likes,
            listens: self.listens,
            comments: self.comments,
            ..Default::default()
        };
        (self.post_id, patch)
    }
}

/// `user:num_following`
#[derive(Debug, Clone, Deserialize)]
pub struct FollowingPayload {
    pub num_following: u64,
}

impl From<FollowingPayload> for UserPatch {
    fn from(p: FollowingPayload) -> Self {
        UserPatch {
            following: Some(p.num_following),
            ..Default::default()
        }
    }
}

/// `user:num_followers`
#[derive(Debug, Clone, Deserialize)]
pub struct FollowersPayload {
    pub num_followers: u64,
}

/// REST user record
#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<Value>,
    #[serde(default, alias = "phoneNumber")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    /// `true` for male, or already a label
    #[serde(default)]
    pub sex: Option<Value>,
    #[serde(
        default,
        alias = "following",
        deserialize_with = "crate::types::lenient::count"
    )]
    pub num_following: u64,
    #[serde(
        default,
        alias = "followers",
        deserialize_with = "crate::types::lenient::count"
    )]
    pub num_followers: u64,
}

impl From<UserPayload> for User {
    fn from(p: UserPayload) -> Self {
        // The avatar comes back either as a bare reference or as
        // `{ "uri": ... }` after an upload.
        let avatar = match p.avatar {
            Some(Value::String(reference)) => Some(reference),
            Some(Value::Object(map)) => map
                .get("uri")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        };
        let sex = match p.sex {
            Some(Value::Bool(true)) => Some("Male".to_string()),
            Some(Value::Bool(false)) => Some("Female".to_string()),
            Some(Value::String(label)) => Some(label),
            _ => None,
        };
        User {
            id: p.id,
            email: p.email,
            username: p.username,
            bio: p.bio,
            avatar,
            phone: p.phone_number,
            address: p.address,
            birthday: p.birthday,
            sex,
            following: p.num_following,
            followers: p.num_followers,
        }
    }
}

/// REST post record
#[derive(Debug, Clone, Deserialize)]
pub struct PostPayload {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub sound: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default, alias = "userId", alias = "author_id")]
    pub user_id: Option<String>,
    #[serde(default, alias = "genreId")]
    pub genre_id: Option<String>,
    #[serde(default, alias = "likes")]
    pub num_like: u64,
    #[serde(default, alias = "listens")]
    pub num_listening: u64,
    #[serde(default, alias = "comments")]
    pub num_comment: u64,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<PostPayload> for Post {
    fn from(p: PostPayload) -> Self {
        Post {
            id: p.id,
            title: p.title.or(p.caption).unwrap_or_default(),
            sound: p.sound,
            thumbnail: p.thumbnail,
            author_id: p.user_id,
            genre_id: p.genre_id,
            likes: p.num_like,
            listens: p.num_listening,
            comments: p.num_comment,
            created_at: p.created_at,
        }
    }
}

/// REST comment record
#[derive(Debug, Clone, Deserialize)]
pub struct CommentPayload {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "postId")]
    pub post_id: String,
    #[serde(alias = "userId", alias = "author_id")]
    pub user_id: String,
    pub content: String,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<CommentPayload> for Comment {
    fn from(p: CommentPayload) -> Self {
        Comment {
            id: p.id,
            post_id: p.post_id,
            author_id: p.user_id,
            content: p.content,
            created_at: p.created_at,
        }
    }
}

/// REST genre record
#[derive(Debug, Clone, Deserialize)]
pub struct GenrePayload {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "title")]
    pub name: String,
}

impl From<GenrePayload> for Genre {
    fn from(p: GenrePayload) -> Self {
        Genre {
            id: p.id,
            name: p.name,
        }
    }
}

/// Paged list envelope returned by the list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default, rename = "totalResults")]
    pub total_results: Option<u64>,
}

// ============================================================================
// Client emits
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoom {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPrivateMessage {
    pub message_id: String,
    pub content: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadNotification {
    pub noti_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_private_message_renames() {
        let payload: PrivateMessagePayload = serde_json::from_value(json!({
            "message_id": "m1",
            "contact_id": "u1_u2",
            "content": "hey",
            "from": "u2",
            "to": "u1",
            "is_unread_at_to": true
        }))
        .unwrap();

        let message = Message::from(payload);
        assert_eq!(message.message_id, "m1");
        assert_eq!(message.contact_id, "u1_u2");
        assert!(message.is_unread_at_to);
    }

    #[test]
    fn test_private_message_without_contact_id() {
        let payload: PrivateMessagePayload = serde_json::from_value(json!({
            "messageId": "m1",
            "content": "hey",
            "from": "zed",
            "to": "amy"
        }))
        .unwrap();

        let message = Message::from(payload);
        assert_eq!(message.contact_id, "amy_zed");
        assert!(!message.is_unread_at_to);
    }

    #[test]
    fn test_notification_renames() {
        let payload: NotificationPayload = serde_json::from_value(json!({
            "id": "n1",
            "user_id": "u2",
            "opponent_id": "u1",
            "source_post_id": "p9",
            "action": "Bookmarked",
            "is_unread": true,
            "created_at": "2024-03-01T10:00:00Z"
        }))
        .unwrap();

        let notification = Notification::from(payload);
        assert_eq!(notification.user_id, "u2");
        assert_eq!(notification.opponent_id, "u1");
        assert_eq!(notification.source_post_id.as_deref(), Some("p9"));
        assert_eq!(notification.action, NotificationAction::Bookmarked);
        assert!(notification.created_at.is_some());
    }

    #[test]
    fn test_counter_payload_aliases() {
        let a: PostCounterPayload =
            serde_json::from_value(json!({"postId": "p1", "likes": 42})).unwrap();
        let b: PostCounterPayload =
            serde_json::from_value(json!({"postId": "p1", "num_listening": 8})).unwrap();

        let (id, patch) = a.into_update();
        assert_eq!(id, "p1");
        assert_eq!(patch.likes, Some(42));
        assert_eq!(patch.listens, None);

        let (_, patch) = b.into_update();
        assert_eq!(patch.listens, Some(8));
        assert_eq!(patch.likes, None);
    }

    #[test]
    fn test_post_record_renames() {
        let payload: PostPayload = serde_json::from_value(json!({
            "_id": "p1",
            "title": "Rain loop",
            "user_id": "u1",
            "num_like": 3,
            "num_listening": 120
        }))
        .unwrap();

        let post = Post::from(payload);
        assert_eq!(post.id, "p1");
        assert_eq!(post.author_id.as_deref(), Some("u1"));
        assert_eq!(post.likes, 3);
        assert_eq!(post.listens, 120);
        assert_eq!(post.comments, 0);
    }

    #[test]
    fn test_user_record_renames() {
        let payload: UserPayload = serde_json::from_value(json!({
            "_id": "u1",
            "email": "amy@example.com",
            "username": "amy",
            "phone_number": "0123",
            "sex": true,
            "avatar": {"uri": "avatars/u1.png"},
            "num_followers": "12"
        }))
        .unwrap();

        let user = User::from(payload);
        assert_eq!(user.id, "u1");
        assert_eq!(user.phone.as_deref(), Some("0123"));
        assert_eq!(user.sex.as_deref(), Some("Male"));
        assert_eq!(user.avatar.as_deref(), Some("avatars/u1.png"));
        assert_eq!(user.followers, 12);
        assert_eq!(user.following, 0);
    }

    #[test]
    fn test_emits_are_camel_case() {
        let value = serde_json::to_value(SendPrivateMessage {
            message_id: "m1".to_string(),
            content: "hi".to_string(),
            from: "u1".to_string(),
            to: "u2".to_string(),
        })
        .unwrap();
        assert_eq!(value["messageId"], "m1");

        let value = serde_json::to_value(ReadNotification {
            noti_id: "n1".to_string(),
        })
        .unwrap();
        assert_eq!(value, json!({"notiId": "n1"}));
    }
}
