//! Derived values computed from the store on demand
//!
//! Nothing here is cached; each call walks the relevant list.

use crate::contact::ContactId;
use crate::store::{AppState, EntityList};
use crate::types::{Message, Notification};

/// Unread messages in the conversation between `me` and `partner`
pub fn unread_messages(messages: &EntityList<Message>, me: &str, partner: &str) -> usize {
    let contact = ContactId::between(me, partner);
    messages
        .iter()
        .filter(|m| contact == m.contact_id && m.is_unread_at_to)
        .count()
}

/// Messages belonging to the conversation between `me` and `partner`
pub fn conversation<'a>(
    messages: &'a EntityList<Message>,
    me: &str,
    partner: &str,
) -> impl Iterator<Item = &'a Message> {
    let contact = ContactId::between(me, partner);
    messages.iter().filter(move |m| contact == m.contact_id)
}

pub fn unread_notifications(notifications: &EntityList<Notification>) -> usize {
    notifications.iter().filter(|n| n.is_unread).count()
}

/// Unread count for a contact row, relative to the logged-in user.
/// Zero when nobody is logged in.
pub fn unread_for_contact(state: &AppState, partner: &str) -> usize {
    match state.me() {
        Some(me) => unread_messages(&state.messenger.messages, me, partner),
        None => 0,
    }
}
