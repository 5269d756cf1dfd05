//! The sync engine: one task that owns the socket
//!
//! [`SyncEngine::run`] multiplexes three inputs and handles them one at a
//! time, so store updates happen in the order inputs are handled:
//!
//! - push events from the [`Transport`], routed through the [`EventRouter`]
//! - [`EngineCommand`]s from any number of [`EngineHandle`]s
//! - finished screen loads
//!
//! A failed command is logged and leaves the store untouched.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use super::events::{Signal, SignalBus};
use super::loader::{self, Loaded, Screen, ScreenEvent, ScreenLoader, Ticket};
use super::router::{EventRouter, Outcome};
use crate::api::Api;
use crate::contact::ContactId;
use crate::error::{ApiError, Result, TransportError, TunecastError};
use crate::selectors;
use crate::store::{Action, Store};
use crate::transport::{ClientEvent, RawEvent, Transport};
use crate::types::{Message, NotificationPatch};
use crate::wire::{CreateRoom, ReadNotification, SendPrivateMessage};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    /// Join the user's room and start handling push events
    Subscribe { user_id: String },
    /// Stop handling push events
    Unsubscribe,
    SendMessage { partner_id: String, content: String },
    ReadNotification { id: String },
    Screen(ScreenEvent),
    Shutdown,
}

/// Cloneable sender for [`EngineCommand`]s
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineCommand>,
}

impl EngineHandle {
    /// Queue a command. Fails only once the engine has stopped.
    pub fn send(&self, command: EngineCommand) -> std::result::Result<(), TransportError> {
        self.tx.send(command).map_err(|_| TransportError::Closed)
    }

    pub fn subscribe(&self, user_id: &str) -> std::result::Result<(), TransportError> {
        self.send(EngineCommand::Subscribe {
            user_id: user_id.to_string(),
        })
    }

    pub fn unsubscribe(&self) -> std::result::Result<(), TransportError> {
        self.send(EngineCommand::Unsubscribe)
    }

    pub fn send_message(
        &self,
        partner_id: &str,
        content: &str,
    ) -> std::result::Result<(), TransportError> {
        self.send(EngineCommand::SendMessage {
            partner_id: partner_id.to_string(),
            content: content.to_string(),
        })
    }

    pub fn read_notification(&self, id: &str) -> std::result::Result<(), TransportError> {
        self.send(EngineCommand::ReadNotification { id: id.to_string() })
    }

    pub fn activate(&self, screen: Screen) -> std::result::Result<(), TransportError> {
        self.send(EngineCommand::Screen(ScreenEvent::Activated(screen)))
    }

    pub fn deactivate(&self, screen: Screen) -> std::result::Result<(), TransportError> {
        self.send(EngineCommand::Screen(ScreenEvent::Deactivated(screen)))
    }

    pub fn shutdown(&self) -> std::result::Result<(), TransportError> {
        self.send(EngineCommand::Shutdown)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

type LoadResult = (Ticket, Result<Loaded>);

/// Upper bound on the contact request awaited inside the loop. The socket
/// is not read meanwhile, so this stays well under the server ping timeout.
const CONTACT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SyncEngine<T: Transport> {
    transport: T,
    transport_open: bool,
    router: EventRouter,
    store: Store,
    bus: SignalBus,
    api: Api,
    loader: ScreenLoader,
    subscribed_as: Option<String>,
    contact_timeout: Duration,
    commands: mpsc::UnboundedReceiver<EngineCommand>,
    loads_tx: mpsc::UnboundedSender<LoadResult>,
    loads_rx: mpsc::UnboundedReceiver<LoadResult>,
}

impl<T: Transport> SyncEngine<T> {
    pub fn new(transport: T, store: Store, bus: SignalBus, api: Api) -> (Self, EngineHandle) {
        let (tx, commands) = mpsc::unbounded_channel();
        let (loads_tx, loads_rx) = mpsc::unbounded_channel();

        let engine = Self {
            transport,
            transport_open: true,
            router: EventRouter::new(),
            store,
            bus,
            api,
            loader: ScreenLoader::new(),
            subscribed_as: None,
            contact_timeout: CONTACT_TIMEOUT,
            commands,
            loads_tx,
            loads_rx,
        };
        (engine, EngineHandle { tx })
    }

    /// Drive the engine until `Shutdown` or until every handle is dropped
    pub async fn run(mut self) -> Result<()> {
        info!("sync engine started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(EngineCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                event = self.transport.next_event(), if self.transport_open => match event {
                    Ok(Some(event)) => self.handle_event(event),
                    Ok(None) => self.lost_transport(None),
                    Err(e) => self.lost_transport(Some(e)),
                },
                Some((ticket, result)) = self.loads_rx.recv() => self.finish_load(ticket, result),
            }
        }

        if self.transport_open {
            if let Err(e) = self.transport.close().await {
                warn!(error = %e, "failed to close transport");
            }
        }
        info!("sync engine stopped");
        Ok(())
    }

    fn lost_transport(&mut self, error: Option<TransportError>) {
        match error {
            Some(e) => error!(error = %e, "transport failed"),
            None => warn!("transport closed by server"),
        }
        self.transport_open = false;
        self.bus.emit(Signal::Disconnected);
    }

    /// Route one push event. Unknown events are ignored, malformed ones dropped.
    fn handle_event(&mut self, event: RawEvent) {
        let RawEvent { name, payload } = event;
        match self.router.route(&name, payload) {
            None => trace!(event = %name, "no handler"),
            Some(Ok(Outcome::Dispatch(action))) => self.store.dispatch(action),
            Some(Ok(Outcome::Publish(signal))) => self.bus.emit(signal),
            Some(Err(e)) => warn!(event = %name, error = %e, "dropping push event"),
        }
    }

    async fn handle_command(&mut self, command: EngineCommand) {
        let kind = command_name(&command);
        let result = match command {
            EngineCommand::Subscribe { user_id } => self.subscribe(user_id).await,
            EngineCommand::Unsubscribe => {
                self.router.clear();
                self.subscribed_as = None;
                debug!("unsubscribed from push events");
                Ok(())
            }
            EngineCommand::SendMessage {
                partner_id,
                content,
            } => self.send_message(&partner_id, content).await,
            EngineCommand::ReadNotification { id } => self.read_notification(id).await,
            EngineCommand::Screen(event) => {
                self.screen_event(event);
                Ok(())
            }
            EngineCommand::Shutdown => Ok(()),
        };

        if let Err(e) = result {
            error!(command = kind, error = %e, "command failed");
        }
    }

    async fn emit(&mut self, event: ClientEvent) -> Result<()> {
        if !self.transport_open {
            return Err(TransportError::Closed.into());
        }
        self.transport.emit(&event).await?;
        Ok(())
    }

    async fn subscribe(&mut self, user_id: String) -> Result<()> {
        self.emit(ClientEvent::CreateRoom(CreateRoom {
            user_id: user_id.clone(),
        }))
        .await?;

        self.router.install_defaults();
        info!(user_id = %user_id, "subscribed to push events");
        self.subscribed_as = Some(user_id.clone());
        self.bus.emit(Signal::Subscribed { user_id });
        Ok(())
    }

    /// The logged-in user, falling back to the subscribed one
    fn me(&self) -> Option<String> {
        self.store
            .select(|s| s.me().map(str::to_string))
            .or_else(|| self.subscribed_as.clone())
    }

    async fn send_message(&mut self, partner_id: &str, content: String) -> Result<()> {
        let me = self
            .me()
            .ok_or_else(|| TunecastError::InvalidInput("no logged-in user".to_string()))?;
        if content.trim().is_empty() {
            return Err(TunecastError::InvalidInput("message is empty".to_string()));
        }

        let first_message = self.store.select(|s| {
            selectors::conversation(&s.messenger.messages, &me, partner_id)
                .next()
                .is_none()
        });
        if first_message {
            timeout(self.contact_timeout, self.api.create_contact(&me, partner_id))
                .await
                .map_err(|_| ApiError::Http("contact request timed out".to_string()))??;
        }

        let message_id = Uuid::new_v4().to_string();
        self.emit(ClientEvent::SendPrivateMessage(SendPrivateMessage {
            message_id: message_id.clone(),
            content: content.clone(),
            from: me.clone(),
            to: partner_id.to_string(),
        }))
        .await?;

        self.store.dispatch(Action::AddMessage(Message {
            message_id,
            contact_id: ContactId::between(&me, partner_id).into_string(),
            from: me,
            to: partner_id.to_string(),
            content,
            is_unread_at_to: false,
            created_at: Some(Utc::now()),
        }));
        Ok(())
    }

    async fn read_notification(&mut self, id: String) -> Result<()> {
        self.emit(ClientEvent::ReadNotification(ReadNotification {
            noti_id: id.clone(),
        }))
        .await?;

        self.store.dispatch(Action::UpdateNotification {
            noti_id: id,
            patch: NotificationPatch::read(),
        });
        Ok(())
    }

    fn screen_event(&mut self, event: ScreenEvent) {
        match event {
            ScreenEvent::Activated(screen) => {
                let ticket = self.loader.activate(screen);
                for action in ticket.screen.start_actions() {
                    self.store.dispatch(action);
                }
                self.spawn_load(ticket);
            }
            ScreenEvent::Deactivated(screen) => {
                for action in self.loader.deactivate(&screen) {
                    self.store.dispatch(action);
                }
            }
        }
    }

    fn spawn_load(&self, ticket: Ticket) {
        let api = self.api.clone();
        let me = self.me();
        let done = self.loads_tx.clone();
        debug!(screen = ?ticket.screen, generation = ticket.generation, "loading screen");

        tokio::spawn(async move {
            let result = loader::load(&api, me.as_deref(), &ticket.screen).await;
            // The engine may already be gone.
            let _ = done.send((ticket, result));
        });
    }

    fn finish_load(&mut self, ticket: Ticket, result: Result<Loaded>) {
        if self.loader.is_current(&ticket) {
            match result {
                Ok(loaded) => self.store.dispatch(loaded.into_action()),
                Err(e) => error!(screen = ?ticket.screen, error = %e, "screen load failed"),
            }
        } else {
            debug!(
                screen = ?ticket.screen,
                generation = ticket.generation,
                "discarding stale load"
            );
        }

        if self.loader.is_latest(&ticket) {
            for action in ticket.screen.finish_actions() {
                self.store.dispatch(action);
            }
        }
    }
}

fn command_name(command: &EngineCommand) -> &'static str {
    match command {
        EngineCommand::Subscribe { .. } => "subscribe",
        EngineCommand::Unsubscribe => "unsubscribe",
        EngineCommand::SendMessage { .. } => "send_message",
        EngineCommand::ReadNotification { .. } => "read_notification",
        EngineCommand::Screen(_) => "screen",
        EngineCommand::Shutdown => "shutdown",
    }
}
