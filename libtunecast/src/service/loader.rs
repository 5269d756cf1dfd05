//! Screen-driven loading
//!
//! A screen that becomes active triggers one background fetch. The fetch
//! carries a [`Ticket`] with the generation the screen had when it was
//! activated; when the result comes back it is applied only if that screen
//! is still active under the same generation. Results for screens that were
//! left, or re-entered since, are dropped.
//!
//! At most one screen of each [`ScreenKind`] is active at a time.
//! Activating a second conversation replaces the first.

use std::collections::HashMap;

use tracing::debug;

use crate::api::Api;
use crate::error::{Result, TunecastError};
use crate::store::Action;
use crate::types::{Comment, Message, Notification, Post, User};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Screen {
    NewsFeed,
    ChatContacts,
    ChatConversation { partner_id: String },
    Notifications,
    Comments { post_id: String },
    ProfileViewer { user_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenKind {
    NewsFeed,
    ChatContacts,
    ChatConversation,
    Notifications,
    Comments,
    ProfileViewer,
}

impl Screen {
    pub fn kind(&self) -> ScreenKind {
        match self {
            Screen::NewsFeed => ScreenKind::NewsFeed,
            Screen::ChatContacts => ScreenKind::ChatContacts,
            Screen::ChatConversation { .. } => ScreenKind::ChatConversation,
            Screen::Notifications => ScreenKind::Notifications,
            Screen::Comments { .. } => ScreenKind::Comments,
            Screen::ProfileViewer { .. } => ScreenKind::ProfileViewer,
        }
    }

    /// Dispatched when the load starts
    pub fn start_actions(&self) -> Vec<Action> {
        match self {
            Screen::Notifications => vec![Action::StartLoading],
            _ => Vec::new(),
        }
    }

    /// Dispatched when the latest load of the screen ends, whether it
    /// succeeded or failed
    pub fn finish_actions(&self) -> Vec<Action> {
        match self {
            Screen::Notifications => vec![Action::StopLoading],
            _ => Vec::new(),
        }
    }

    /// Dispatched when the screen is left
    pub fn teardown_actions(&self) -> Vec<Action> {
        match self {
            Screen::ChatConversation { .. } => vec![Action::ClearMessages],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScreenEvent {
    Activated(Screen),
    Deactivated(Screen),
}

/// Identifies one load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub screen: Screen,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct ScreenLoader {
    active: HashMap<ScreenKind, Ticket>,
    next_generation: u64,
}

impl ScreenLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `screen` active and return the ticket its load must present
    pub fn activate(&mut self, screen: Screen) -> Ticket {
        self.next_generation += 1;
        let ticket = Ticket {
            screen,
            generation: self.next_generation,
        };
        if let Some(previous) = self.active.insert(ticket.screen.kind(), ticket.clone()) {
            debug!(screen = ?previous.screen, "screen replaced");
        }
        ticket
    }

    /// Mark `screen` inactive. Returns the teardown actions, or nothing if
    /// `screen` was not the active screen of its kind.
    pub fn deactivate(&mut self, screen: &Screen) -> Vec<Action> {
        let kind = screen.kind();
        match self.active.get(&kind) {
            Some(ticket) if &ticket.screen == screen => {
                self.active.remove(&kind);
                screen.teardown_actions()
            }
            _ => Vec::new(),
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.active.get(&ticket.screen.kind()) == Some(ticket)
    }

    /// True unless a newer load of the same kind is still outstanding.
    /// A screen that was left has no outstanding load.
    pub fn is_latest(&self, ticket: &Ticket) -> bool {
        self.active
            .get(&ticket.screen.kind())
            .map_or(true, |active| active == ticket)
    }

    pub fn is_active(&self, screen: &Screen) -> bool {
        self.active
            .get(&screen.kind())
            .is_some_and(|t| &t.screen == screen)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

/// Result of one screen load
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    Posts(Vec<Post>),
    Users(Vec<User>),
    Messages(Vec<Message>),
    Notifications(Vec<Notification>),
    Comments(Vec<Comment>),
    User(User),
}

impl Loaded {
    pub fn into_action(self) -> Action {
        match self {
            Loaded::Posts(posts) => Action::SetPosts(posts),
            Loaded::Users(users) => Action::SetUsers(users),
            Loaded::Messages(messages) => Action::SetMessages(messages),
            Loaded::Notifications(list) => Action::SetNotifications(list),
            Loaded::Comments(comments) => Action::SetComments(comments),
            Loaded::User(user) => Action::AddUser(user),
        }
    }
}

fn require_me(me: Option<&str>) -> Result<&str> {
    me.ok_or_else(|| TunecastError::InvalidInput("no logged-in user".to_string()))
}

/// Fetch what `screen` shows. `me` is the logged-in user id, if any.
pub async fn load(api: &Api, me: Option<&str>, screen: &Screen) -> Result<Loaded> {
    let loaded = match screen {
        Screen::NewsFeed => Loaded::Posts(api.list_posts().await?),
        Screen::ChatContacts => Loaded::Users(api.list_users_except(require_me(me)?).await?),
        Screen::ChatConversation { partner_id } => {
            Loaded::Messages(api.list_messages(require_me(me)?, partner_id).await?)
        }
        Screen::Notifications => {
            Loaded::Notifications(api.list_notifications(require_me(me)?).await?)
        }
        Screen::Comments { post_id } => Loaded::Comments(api.list_comments(post_id).await?),
        Screen::ProfileViewer { user_id } => Loaded::User(api.get_user(user_id).await?),
    };
    Ok(loaded)
}
