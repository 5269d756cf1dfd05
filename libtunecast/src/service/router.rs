//! Push-event dispatch table
//!
//! Maps each server event name to exactly one handler. A handler is a plain
//! function from the raw JSON payload to an [`Outcome`]: a single store
//! action or a single bus signal. Handlers never perform I/O; the engine
//! applies the outcome.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::PayloadError;
use crate::service::events::Signal;
use crate::store::Action;
use crate::types::{Message, Notification, UserPatch};
use crate::wire::{
    FollowersPayload, FollowingPayload, NotificationPayload, PostCounterPayload,
    PrivateMessagePayload,
};

pub const PRIVATE_MESSAGE: &str = "messenger:send_private_message";
pub const NOTIFICATION: &str = "notification:send_notification";
pub const POST_NUM_LIKE: &str = "post:num_like";
pub const POST_NUM_LISTENING: &str = "post:num_listening";
pub const USER_NUM_FOLLOWING: &str = "user:num_following";
pub const USER_NUM_FOLLOWERS: &str = "user:num_followers";

/// What a handler asks the engine to do
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Dispatch(Action),
    Publish(Signal),
}

pub type Handler = fn(Value) -> Result<Outcome, PayloadError>;

/// Event name → handler, at most one handler per name
#[derive(Default, Clone)]
pub struct EventRouter {
    handlers: HashMap<String, Handler>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router preloaded with the push handlers the client listens for
    pub fn with_defaults() -> Self {
        let mut router = Self::new();
        router.install_defaults();
        router
    }

    /// Install (or reinstall) the default table. Idempotent.
    pub fn install_defaults(&mut self) {
        for (event, handler) in default_table() {
            self.register(event, handler);
        }
    }

    /// Register `handler` for `event`, replacing any previous one.
    /// Returns true when a handler was replaced.
    pub fn register(&mut self, event: &str, handler: Handler) -> bool {
        self.handlers.insert(event.to_string(), handler).is_some()
    }

    /// Returns true when a handler was removed.
    pub fn unregister(&mut self, event: &str) -> bool {
        self.handlers.remove(event).is_some()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub fn is_registered(&self, event: &str) -> bool {
        self.handlers.contains_key(event)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered event names, sorted
    pub fn events(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run the handler for `event`. `None` when nothing is registered.
    pub fn route(&self, event: &str, payload: Value) -> Option<Result<Outcome, PayloadError>> {
        self.handlers.get(event).map(|handler| handler(payload))
    }
}

fn default_table() -> [(&'static str, Handler); 6] {
    [
        (PRIVATE_MESSAGE, on_private_message as Handler),
        (NOTIFICATION, on_notification as Handler),
        (POST_NUM_LIKE, on_post_counter as Handler),
        (POST_NUM_LISTENING, on_post_counter as Handler),
        (USER_NUM_FOLLOWING, on_num_following as Handler),
        (USER_NUM_FOLLOWERS, on_num_followers as Handler),
    ]
}

fn parse<T: DeserializeOwned>(event: &str, payload: Value) -> Result<T, PayloadError> {
    serde_json::from_value(payload).map_err(|e| PayloadError::Malformed {
        event: event.to_string(),
        reason: e.to_string(),
    })
}

fn on_private_message(payload: Value) -> Result<Outcome, PayloadError> {
    let p: PrivateMessagePayload = parse(PRIVATE_MESSAGE, payload)?;
    Ok(Outcome::Dispatch(Action::AddMessage(Message::from(p))))
}

fn on_notification(payload: Value) -> Result<Outcome, PayloadError> {
    let p: NotificationPayload = parse(NOTIFICATION, payload)?;
    Ok(Outcome::Dispatch(Action::AddNotification(Notification::from(p))))
}

fn on_post_counter(payload: Value) -> Result<Outcome, PayloadError> {
    let p: PostCounterPayload = parse("post counter", payload)?;
    let (post_id, patch) = p.into_update();
    Ok(Outcome::Dispatch(Action::UpdatePost { post_id, patch }))
}

fn on_num_following(payload: Value) -> Result<Outcome, PayloadError> {
    let p: FollowingPayload = parse(USER_NUM_FOLLOWING, payload)?;
    Ok(Outcome::Dispatch(Action::UpdateUser(UserPatch::from(p))))
}

fn on_num_followers(payload: Value) -> Result<Outcome, PayloadError> {
    let p: FollowersPayload = parse(USER_NUM_FOLLOWERS, payload)?;
    Ok(Outcome::Publish(Signal::Followers {
        count: p.num_followers,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PostPatch;
    use serde_json::json;

    #[test]
    fn test_defaults_cover_every_push_event() {
        let router = EventRouter::with_defaults();
        let mut expected = vec![
            PRIVATE_MESSAGE,
            NOTIFICATION,
            POST_NUM_LIKE,
            POST_NUM_LISTENING,
            USER_NUM_FOLLOWING,
            USER_NUM_FOLLOWERS,
        ];
        expected.sort_unstable();
        assert_eq!(router.events(), expected);
    }

    #[test]
    fn test_reinstall_keeps_one_handler_per_event() {
        let mut router = EventRouter::with_defaults();
        router.install_defaults();
        router.install_defaults();
        assert_eq!(router.len(), 6);
    }

    #[test]
    fn test_register_replaces() {
        fn ignore(_: Value) -> Result<Outcome, PayloadError> {
            Ok(Outcome::Dispatch(Action::StopLoading))
        }

        let mut router = EventRouter::with_defaults();
        assert!(router.register(POST_NUM_LIKE, ignore));
        assert_eq!(router.len(), 6);

        let outcome = router.route(POST_NUM_LIKE, json!({})).unwrap().unwrap();
        assert_eq!(outcome, Outcome::Dispatch(Action::StopLoading));
    }

    #[test]
    fn test_unregister_and_unknown_event() {
        let mut router = EventRouter::with_defaults();
        assert!(router.unregister(USER_NUM_FOLLOWERS));
        assert!(!router.unregister(USER_NUM_FOLLOWERS));
        assert!(router.route(USER_NUM_FOLLOWERS, json!({})).is_none());
        assert!(router.route("chat:typing", json!({})).is_none());
    }

    #[test]
    fn test_num_like_maps_to_update_post() {
        let router = EventRouter::with_defaults();
        let outcome = router
            .route(POST_NUM_LIKE, json!({"postId": "p1", "likes": 42}))
            .unwrap()
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Dispatch(Action::UpdatePost {
                post_id: "p1".to_string(),
                patch: PostPatch {
                    likes: Some(42),
                    ..Default::default()
                },
            })
        );
    }

    #[test]
    fn test_num_followers_publishes_signal() {
        let router = EventRouter::with_defaults();
        let outcome = router
            .route(USER_NUM_FOLLOWERS, json!({"num_followers": 10}))
            .unwrap()
            .unwrap();
        assert_eq!(outcome, Outcome::Publish(Signal::Followers { count: 10 }));
    }

    #[test]
    fn test_num_following_updates_user() {
        let router = EventRouter::with_defaults();
        let outcome = router
            .route(USER_NUM_FOLLOWING, json!({"num_following": 3}))
            .unwrap()
            .unwrap();
        match outcome {
            Outcome::Dispatch(Action::UpdateUser(patch)) => {
                assert_eq!(patch.following, Some(3));
                assert_eq!(patch.followers, None);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_payload() {
        let router = EventRouter::with_defaults();
        let err = router
            .route(PRIVATE_MESSAGE, json!({"content": 5}))
            .unwrap()
            .unwrap_err();
        assert!(err.to_string().contains(PRIVATE_MESSAGE));
    }
}
