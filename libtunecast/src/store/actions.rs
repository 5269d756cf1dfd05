//! Actions for the reducer pattern
//!
//! Every store transition is described by one [`Action`]. Actions are plain
//! data; the reducer (see `reducer.rs`) is the only place they take effect.

use crate::types::{
    Comment, CommentPatch, Message, MessagePatch, Notification, NotificationPatch, Post,
    PostPatch, User, UserPatch,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // === User ===
    /// Replace the logged-in user
    SetUser(User),

    /// Shallow-merge into the logged-in user (no-op when logged out)
    UpdateUser(UserPatch),

    /// Forget the logged-in user and the user cache
    ClearUser,

    /// Replace the cache of other users
    SetUsers(Vec<User>),

    /// Upsert one user into the cache
    AddUser(User),

    // === Posts ===
    SetPosts(Vec<Post>),
    AddPost(Post),
    UpdatePost { post_id: String, patch: PostPatch },
    ClearPosts,

    // === Comments ===
    SetComments(Vec<Comment>),
    AddComment(Comment),
    UpdateComment { comment_id: String, patch: CommentPatch },
    ClearComments,

    // === Messenger ===
    SetMessages(Vec<Message>),
    AddMessage(Message),
    UpdateMessage { message_id: String, patch: MessagePatch },
    ClearMessages,

    // === Notifications ===
    SetNotifications(Vec<Notification>),
    AddNotification(Notification),
    UpdateNotification { noti_id: String, patch: NotificationPatch },
    ClearNotifications,

    // === Common ===
    StartLoading,
    StopLoading,
}

impl Action {
    /// Stable name used in logs, in the `SET_MESSAGES` style.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::SetUser(_) => "SET_USER",
            Action::UpdateUser(_) => "UPDATE_USER",
            Action::ClearUser => "CLEAR_USER",
            Action::SetUsers(_) => "SET_USERS",
            Action::AddUser(_) => "ADD_USER",
            Action::SetPosts(_) => "SET_POSTS",
            Action::AddPost(_) => "ADD_POST",
            Action::UpdatePost { .. } => "UPDATE_POST",
            Action::ClearPosts => "CLEAR_POSTS",
            Action::SetComments(_) => "SET_COMMENTS",
            Action::AddComment(_) => "ADD_COMMENT",
            Action::UpdateComment { .. } => "UPDATE_COMMENT",
            Action::ClearComments => "CLEAR_COMMENTS",
            Action::SetMessages(_) => "SET_MESSAGES",
            Action::AddMessage(_) => "ADD_MESSAGE",
            Action::UpdateMessage { .. } => "UPDATE_MESSAGE",
            Action::ClearMessages => "CLEAR_MESSAGES",
            Action::SetNotifications(_) => "SET_NOTIFICATIONS",
            Action::AddNotification(_) => "ADD_NOTIFICATION",
            Action::UpdateNotification { .. } => "UPDATE_NOTIFICATION",
            Action::ClearNotifications => "CLEAR_NOTIFICATIONS",
            Action::StartLoading => "START_LOADING",
            Action::StopLoading => "STOP_LOADING",
        }
    }
}
