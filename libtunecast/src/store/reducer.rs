//! Pure reducer function for state transitions
//!
//! `reduce(State, Action) -> State` has no side effects: no network, no
//! filesystem, no logging. It is defined for every action, including
//! updates that target ids the state does not hold.

use super::actions::Action;
use super::state::{AppState, CommonState, MessengerState, UserState};
use crate::store::entity::Patch;

pub fn reduce(state: AppState, action: Action) -> AppState {
    match action {
        // === User ===
        Action::SetUser(user) => AppState {
            user: UserState {
                logged_in_user: Some(user),
                ..state.user
            },
            ..state
        },

        Action::UpdateUser(patch) => {
            let mut user = state.user;
            if let Some(ref mut me) = user.logged_in_user {
                patch.apply(me);
            }
            AppState { user, ..state }
        }

        Action::ClearUser => AppState {
            user: UserState::default(),
            ..state
        },

        Action::SetUsers(users) => {
            let mut user = state.user;
            user.users.set(users);
            AppState { user, ..state }
        }

        Action::AddUser(cached) => {
            let mut user = state.user;
            user.users.add(cached);
            AppState { user, ..state }
        }

        // === Posts ===
        Action::SetPosts(items) => {
            let mut posts = state.posts;
            posts.set(items);
            AppState { posts, ..state }
        }

        Action::AddPost(post) => {
            let mut posts = state.posts;
            posts.add(post);
            AppState { posts, ..state }
        }

        Action::UpdatePost { post_id, patch } => {
            let mut posts = state.posts;
            posts.update(&post_id, patch);
            AppState { posts, ..state }
        }

        Action::ClearPosts => {
            let mut posts = state.posts;
            posts.clear();
            AppState { posts, ..state }
        }

        // === Comments ===
        Action::SetComments(items) => {
            let mut comments = state.comments;
            comments.set(items);
            AppState { comments, ..state }
        }

        Action::AddComment(comment) => {
            let mut comments = state.comments;
            comments.add(comment);
            AppState { comments, ..state }
        }

        Action::UpdateComment { comment_id, patch } => {
            let mut comments = state.comments;
            comments.update(&comment_id, patch);
            AppState { comments, ..state }
        }

        Action::ClearComments => {
            let mut comments = state.comments;
            comments.clear();
            AppState { comments, ..state }
        }

        // === Messenger ===
        Action::SetMessages(items) => {
            let mut messages = state.messenger.messages;
            messages.set(items);
            AppState {
                messenger: MessengerState { messages },
                ..state
            }
        }

        Action::AddMessage(message) => {
            let mut messages = state.messenger.messages;
            messages.add(message);
            AppState {
                messenger: MessengerState { messages },
                ..state
            }
        }

        Action::UpdateMessage { message_id, patch } => {
            let mut messages = state.messenger.messages;
            messages.update(&message_id, patch);
            AppState {
                messenger: MessengerState { messages },
                ..state
            }
        }

        Action::ClearMessages => AppState {
            messenger: MessengerState::default(),
            ..state
        },

        // === Notifications ===
        Action::SetNotifications(items) => {
            let mut notifications = state.notifications;
            notifications.set(items);
            AppState {
                notifications,
                ..state
            }
        }

        Action::AddNotification(notification) => {
            let mut notifications = state.notifications;
            notifications.add(notification);
            AppState {
                notifications,
                ..state
            }
        }

        Action::UpdateNotification { noti_id, patch } => {
            let mut notifications = state.notifications;
            notifications.update(&noti_id, patch);
            AppState {
                notifications,
                ..state
            }
        }

        Action::ClearNotifications => {
            let mut notifications = state.notifications;
            notifications.clear();
            AppState {
                notifications,
                ..state
            }
        }

        // === Common ===
        Action::StartLoading => AppState {
            common: CommonState { loading: true },
            ..state
        },

        Action::StopLoading => AppState {
            common: CommonState { loading: false },
            ..state
        },
    }
}
