//! Session-scoped state shared with plugins.
//!
//! Every plugin is constructed with a [`SessionHandle`]. The handle is a cheap
//! clone of one `Arc` and gives the plugin:
//!
//! - the [`Transport`] used to post messages,
//! - the current [`IdentitySnapshot`], once the session has authenticated,
//! - the bot configuration section, deserialised on demand,
//! - the names of every registered plugin, so `init` can see siblings that
//!   were registered after it.
//!
//! The session controller is the only writer. It replaces the snapshot
//! wholesale on every authentication; readers holding an older
//! `Arc<IdentitySnapshot>` keep a consistent view.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;

use lychii_core::{BoxedTransport, Channel, InboundMessage, IdentitySnapshot, TransportResult};

struct SessionShared {
    transport: BoxedTransport,
    config: Arc<Value>,
    identity: RwLock<Option<Arc<IdentitySnapshot>>>,
    plugins: RwLock<Vec<String>>,
}

/// Cloneable handle onto session state.
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<SessionShared>,
}

impl SessionHandle {
    /// Creates a handle with no identity and no registered plugins.
    ///
    /// `config` is the bot configuration section as JSON.
    pub fn new(transport: BoxedTransport, config: Value) -> Self {
        Self {
            shared: Arc::new(SessionShared {
                transport,
                config: Arc::new(config),
                identity: RwLock::new(None),
                plugins: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Returns the transport.
    pub fn transport(&self) -> &BoxedTransport {
        &self.shared.transport
    }

    /// Posts `text` to `channel`.
    pub fn send(&self, text: &str, channel: &Channel) -> TransportResult<()> {
        self.shared.transport.send(text, channel)
    }

    /// Replies to `original` in the channel it came from.
    pub fn reply(&self, text: &str, original: &InboundMessage) -> TransportResult<()> {
        self.shared.transport.reply(text, original)
    }

    /// Returns the current identity snapshot, if the session has authenticated.
    pub fn identity(&self) -> Option<Arc<IdentitySnapshot>> {
        self.shared.identity.read().clone()
    }

    /// Replaces the identity snapshot.
    pub fn set_identity(&self, snapshot: IdentitySnapshot) -> Arc<IdentitySnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.shared.identity.write() = Some(snapshot.clone());
        snapshot
    }

    /// Returns the raw bot configuration section.
    pub fn raw_config(&self) -> &Value {
        &self.shared.config
    }

    /// Deserialises the bot configuration section into `T`.
    ///
    /// Use `#[serde(default)]` on `T` to tolerate missing fields.
    pub fn config<T>(&self) -> serde_json::Result<T>
    where
        T: DeserializeOwned,
    {
        T::deserialize(self.shared.config.as_ref())
    }

    /// Returns the names of all registered plugins, in registration order.
    pub fn plugin_names(&self) -> Vec<String> {
        self.shared.plugins.read().clone()
    }

    pub(crate) fn record_plugin(&self, name: &str) {
        self.shared.plugins.write().push(name.to_string());
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("identity", &self.shared.identity.read().is_some())
            .field("plugins", &*self.shared.plugins.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lychii_core::{AuthPayload, SelfInfo, create_transport_channels};
    use serde::Deserialize;
    use serde_json::json;

    fn handle(config: Value) -> SessionHandle {
        let (session, _link) = create_transport_channels(1);
        SessionHandle::new(session.transport, config)
    }

    #[test]
    fn test_identity_is_replaced_wholesale() {
        let handle = handle(Value::Null);
        assert!(handle.identity().is_none());

        let first = AuthPayload {
            self_info: SelfInfo {
                id: "U1".into(),
                name: "lychii".into(),
                bot_id: None,
            },
            ..Default::default()
        };
        let old = handle.set_identity(IdentitySnapshot::assemble(first, "ops"));

        let mut second = AuthPayload::default();
        second.self_info.id = "U9".into();
        handle.set_identity(IdentitySnapshot::assemble(second, "ops"));

        assert_eq!(old.self_id(), "U1");
        assert_eq!(handle.identity().unwrap().self_id(), "U9");
    }

    #[test]
    fn test_config_deserialises_on_demand() {
        #[derive(Deserialize)]
        struct Partial {
            default_channel: String,
            #[serde(default)]
            missing: Option<u32>,
        }

        let handle = handle(json!({ "default_channel": "ops", "token": "t" }));
        let partial: Partial = handle.config().unwrap();
        assert_eq!(partial.default_channel, "ops");
        assert_eq!(partial.missing, None);
    }

    #[test]
    fn test_clones_share_plugin_names() {
        let handle = handle(Value::Null);
        let clone = handle.clone();
        handle.record_plugin("greeter");

        assert_eq!(clone.plugin_names(), vec!["greeter".to_string()]);
    }
}
