//! Session controller.
//!
//! A [`Session`] owns the plugin registry, the mention filter and the
//! connection state machine. It consumes [`TransportEvent`]s one at a time;
//! each event is handled to completion before the next one is read.
//!
//! ```text
//!                start()            authenticated            connected
//! Disconnected ─────────▶ Authenticating ─────────▶ Authenticated ─────────▶ Connected
//!      ▲                                                 ▲   │                 │   ▲
//!      │ disconnected (auto_reconnect = false)           │   │ disconnected    │   │
//!      │ or reconnect timeout                    re-auth │   ▼                 │   │ connected
//!      └──────────────────────────────────────────── AwaitingReconnect ◀───────┘   │ (no announcement)
//!                                                              └───────────────────┘
//! ```
//!
//! Messages reach plugins only in the `Connected` state.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, debug_span, error, info, trace, warn};

use lychii_core::{
    AuthPayload, BoxedTransport, IdentitySnapshot, InboundMessage, MessageKind, ReactionPayload,
    TransportEvent,
};
use lychii_framework::{
    CatalogLoader, MentionFilter, PluginDescriptor, PluginLoader, PluginRegistry, SessionHandle,
};

use crate::config::{BotConfig, ConfigError};
use crate::error::{RuntimeError, RuntimeResult};

/// Connection state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not started, or terminated.
    Disconnected,
    /// `start` was sent; waiting for the authentication payload.
    Authenticating,
    /// Identity is known; waiting for the connection to be confirmed.
    Authenticated,
    /// Live. Messages are routed to plugins.
    Connected,
    /// The connection dropped; waiting for the transport to recover.
    AwaitingReconnect,
}

/// Builds a [`Session`] and loads its plugins.
pub struct SessionBuilder {
    config: BotConfig,
    transport: BoxedTransport,
    loader: Box<dyn PluginLoader>,
    plugins: Vec<PluginDescriptor>,
}

impl SessionBuilder {
    /// Replaces the loader used for `plugin_dir_path`.
    pub fn loader(mut self, loader: impl PluginLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Registers `descriptor` after the built-in plugins and before the
    /// plugin directory.
    pub fn plugin(mut self, descriptor: PluginDescriptor) -> Self {
        self.plugins.push(descriptor);
        self
    }

    /// Registers every plugin, then initializes them all.
    ///
    /// An unreadable plugin directory is fatal, as is a config that cannot be
    /// serialised for plugins.
    pub fn build(self) -> RuntimeResult<Session> {
        let config_value = serde_json::to_value(&self.config).map_err(|e| {
            ConfigError::validation(format!("bot config cannot be shared with plugins: {e}"))
        })?;
        let handle = SessionHandle::new(self.transport, config_value);
        let mut registry = PluginRegistry::new();

        if self.config.builtin_plugins {
            register_builtins(&mut registry, &handle);
        }

        for descriptor in &self.plugins {
            registry.register(descriptor, &handle);
        }

        if let Some(dir) = &self.config.plugin_dir_path {
            load_plugin_dir(&mut registry, self.loader.as_ref(), dir, &handle)?;
        }

        let active = registry.init_all();
        info!(registered = registry.len(), active, "Plugins initialised");

        Ok(Session {
            config: self.config,
            handle,
            registry,
            filter: None,
            state: SessionState::Disconnected,
            announced: false,
            reconnect_deadline: None,
        })
    }
}

#[cfg(feature = "builtin-plugins")]
fn register_builtins(registry: &mut PluginRegistry, handle: &SessionHandle) {
    for descriptor in lychii_framework::plugin::builtin::descriptors() {
        registry.register(&descriptor, handle);
    }
}

#[cfg(not(feature = "builtin-plugins"))]
fn register_builtins(_registry: &mut PluginRegistry, _handle: &SessionHandle) {
    debug!("Built-in plugins are not compiled in");
}

fn load_plugin_dir(
    registry: &mut PluginRegistry,
    loader: &dyn PluginLoader,
    dir: &Path,
    handle: &SessionHandle,
) -> RuntimeResult<()> {
    match registry.load(loader, dir, handle) {
        Ok(count) => {
            info!(path = %dir.display(), count, "Loaded user plugins");
            Ok(())
        }
        Err(e) => {
            error!(path = %dir.display(), error = %e, "Failed to load user plugins");
            Err(e.into())
        }
    }
}

/// One bot session over one transport.
pub struct Session {
    config: BotConfig,
    handle: SessionHandle,
    registry: PluginRegistry,
    filter: Option<MentionFilter>,
    state: SessionState,
    announced: bool,
    reconnect_deadline: Option<Instant>,
}

impl Session {
    /// Starts building a session for `config` over `transport`.
    pub fn builder(config: BotConfig, transport: BoxedTransport) -> SessionBuilder {
        SessionBuilder {
            config,
            transport,
            loader: Box::new(CatalogLoader::new()),
            plugins: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Handle shared with plugins.
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Current identity snapshot, once authenticated.
    pub fn identity(&self) -> Option<Arc<IdentitySnapshot>> {
        self.handle.identity()
    }

    /// Sends the start command to the transport.
    pub fn start(&mut self) -> RuntimeResult<()> {
        if self.state != SessionState::Disconnected {
            return Err(RuntimeError::AlreadyStarted);
        }
        self.handle.transport().start()?;
        self.announced = false;
        self.set_state(SessionState::Authenticating);
        Ok(())
    }

    /// Closes the transport and returns to `Disconnected`.
    pub fn stop(&mut self) {
        if self.state == SessionState::Disconnected {
            return;
        }
        if let Err(e) = self.handle.transport().disconnect() {
            warn!(error = %e, "Transport disconnect failed");
        }
        self.reconnect_deadline = None;
        self.set_state(SessionState::Disconnected);
    }

    /// Handles one transport event.
    ///
    /// Returns an error when the event ends the session.
    pub fn handle_event(&mut self, event: TransportEvent) -> RuntimeResult<()> {
        trace!(event = event.name(), state = ?self.state, "Handling transport event");
        match event {
            TransportEvent::Authenticated(payload) => self.on_authenticated(payload),
            TransportEvent::Connected => {
                self.on_connected();
                Ok(())
            }
            TransportEvent::Message(message) => {
                self.on_message(message);
                Ok(())
            }
            TransportEvent::ReactionAdded(reaction) => {
                on_reaction(&reaction);
                Ok(())
            }
            TransportEvent::Disconnected { reason } => self.on_disconnected(reason),
        }
    }

    /// Starts the session and handles events until Ctrl+C or SIGTERM.
    pub async fn run(&mut self, events: mpsc::Receiver<TransportEvent>) -> RuntimeResult<()> {
        self.run_until(events, shutdown_signal()).await
    }

    /// Starts the session and handles events until `shutdown` completes or
    /// the session terminates.
    pub async fn run_until<F>(
        &mut self,
        mut events: mpsc::Receiver<TransportEvent>,
        shutdown: F,
    ) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start()?;
        tokio::pin!(shutdown);

        loop {
            let deadline = self.reconnect_deadline;
            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutting down session");
                    self.stop();
                    return Ok(());
                }
                () = wait_until(deadline) => {
                    return Err(self.reconnect_timed_out());
                }
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event)?,
                    None => {
                        warn!("Transport event stream closed");
                        self.stop();
                        return Err(RuntimeError::EventStreamClosed);
                    }
                },
            }
        }
    }

    fn set_state(&mut self, next: SessionState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "Session state changed");
            self.state = next;
        }
    }

    fn on_authenticated(&mut self, payload: AuthPayload) -> RuntimeResult<()> {
        if self.state == SessionState::Disconnected {
            warn!("Ignoring authentication while disconnected");
            return Ok(());
        }

        let snapshot = IdentitySnapshot::assemble(payload, &self.config.default_channel);

        if snapshot.bot_id().is_none() {
            warn!(
                self_id = %snapshot.self_id(),
                "Bot id not found in the user directory; integration messages from the bot will not be recognised"
            );
        }
        match snapshot.default_channel() {
            Some(channel) => debug!(channel = %channel.display_name(), "Default channel resolved"),
            None => warn!(
                channel = %self.config.default_channel,
                "Default channel not found; status announcements are disabled"
            ),
        }

        let name = self
            .config
            .name
            .clone()
            .unwrap_or_else(|| snapshot.self_name().to_string());
        self.filter = Some(MentionFilter::new(&name)?);

        info!(team = %snapshot.team().name, user = %snapshot.self_name(), "Authenticated");
        self.handle.set_identity(snapshot);
        self.set_state(SessionState::Authenticated);
        Ok(())
    }

    fn on_connected(&mut self) {
        match self.state {
            SessionState::Authenticated | SessionState::AwaitingReconnect => {}
            state => {
                warn!(state = ?state, "Ignoring connection event");
                return;
            }
        }

        let resumed = self.state == SessionState::AwaitingReconnect;
        self.reconnect_deadline = None;
        self.set_state(SessionState::Connected);

        if resumed {
            info!("Connection restored");
        } else {
            info!("Connected");
        }
        if !self.announced {
            self.announce();
        }
    }

    fn announce(&mut self) {
        self.announced = true;
        let Some(identity) = self.handle.identity() else {
            return;
        };
        let Some(channel) = identity.default_channel() else {
            debug!("No default channel, skipping announcement");
            return;
        };

        let text = format!("Hello! I'm {}", identity.self_name());
        if let Err(e) = self.handle.send(&text, channel) {
            warn!(channel = %channel.display_name(), error = %e, "Failed to announce presence");
        }
    }

    fn on_disconnected(&mut self, reason: Option<String>) -> RuntimeResult<()> {
        let reason = reason.unwrap_or_else(|| "connection closed".to_string());
        match self.state {
            SessionState::Disconnected | SessionState::AwaitingReconnect => {
                debug!(state = ?self.state, %reason, "Ignoring disconnect");
                return Ok(());
            }
            _ => {}
        }

        if self.config.auto_reconnect {
            let timeout = self.config.reconnect_timeout();
            self.reconnect_deadline = timeout.map(|t| Instant::now() + t);
            warn!(%reason, timeout = ?timeout, "Disconnected, waiting for reconnect");
            self.set_state(SessionState::AwaitingReconnect);
            Ok(())
        } else {
            error!(%reason, "Disconnected, terminating session");
            self.stop();
            Err(RuntimeError::ConnectionLost { reason })
        }
    }

    fn reconnect_timed_out(&mut self) -> RuntimeError {
        let timeout = self.config.reconnect_timeout().unwrap_or(Duration::ZERO);
        error!(timeout = ?timeout, "Transport did not reconnect in time, terminating session");
        self.stop();
        RuntimeError::ReconnectTimedOut(timeout)
    }

    fn on_message(&mut self, mut message: InboundMessage) {
        if self.state != SessionState::Connected {
            debug!(state = ?self.state, "Ignoring message received before connection");
            return;
        }

        let kind = message.kind();
        let user = message.sender_name().to_string();
        let channel = message.channel.display_name().to_string();
        match kind {
            MessageKind::Joined => {
                info!(%user, %channel, "User joined channel");
                return;
            }
            MessageKind::Left => {
                info!(%user, %channel, "User left channel");
                return;
            }
            MessageKind::TopicChanged => {
                let topic = message.topic.as_deref().unwrap_or_default();
                info!(%user, %channel, %topic, "Channel topic changed");
                return;
            }
            MessageKind::Other(ref subtype) => {
                debug!(%subtype, %channel, "Ignoring message subtype");
                return;
            }
            MessageKind::Message | MessageKind::BotMessage => {}
        }

        let (Some(identity), Some(filter)) = (self.handle.identity(), self.filter.as_ref()) else {
            return;
        };
        if !filter.accept(&message, &identity) {
            trace!(%user, %channel, "Message not addressed to the bot");
            return;
        }
        filter.trim(&mut message);

        let _span = debug_span!("dispatch", %channel, subtype = %kind).entered();
        debug!(%user, text = %message.text, "Processing message");
        let matched = self.registry.dispatch(&mut message);
        debug!(matched, "Dispatch complete");
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

fn on_reaction(reaction: &ReactionPayload) {
    debug!(user = %reaction.user, reaction = %reaction.reaction, "Reaction added");
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Completes on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
