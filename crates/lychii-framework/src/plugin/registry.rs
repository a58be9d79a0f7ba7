//! Ordered collection of live plugins.
//!
//! Loading is two-phase: every plugin is registered first (defaults, then the
//! user directory), and only then does [`PluginRegistry::init_all`] run each
//! `init` hook. A plugin can therefore see siblings registered after it.
//!
//! ```text
//! register() ──► Registered
//! init_all() ──► Active   (init succeeded)
//!            ──► Failed   (init returned an error or panicked; never dispatched)
//! ```
//!
//! Registration order is dispatch order.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use tracing::{debug, debug_span, error, info};

use lychii_core::InboundMessage;

use super::{Plugin, PluginDescriptor, PluginLoader};
use crate::error::{PluginError, PluginResult};
use crate::processor::panic_error;
use crate::session::SessionHandle;

/// Lifecycle state of a registered plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    /// Registered, `init` not yet called.
    Registered,
    /// Initialised and receiving messages.
    Active,
    /// `init` failed; the plugin is skipped during dispatch.
    Failed,
}

struct PluginEntry {
    plugin: Box<dyn Plugin>,
    state: PluginState,
}

/// Owns every plugin for one session.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<PluginEntry>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiates `descriptor` for `session` and appends it.
    pub fn register(&mut self, descriptor: &PluginDescriptor, session: &SessionHandle) {
        let plugin = descriptor.instantiate(session.clone());
        session.record_plugin(plugin.name());
        self.add(plugin);
    }

    /// Appends an already constructed plugin.
    pub fn add(&mut self, plugin: Box<dyn Plugin>) {
        info!(plugin = %plugin.name(), position = self.plugins.len(), "Registered plugin");
        self.plugins.push(PluginEntry {
            plugin,
            state: PluginState::Registered,
        });
    }

    /// Discovers plugins under `path` and registers them in discovery order.
    ///
    /// Returns the number of plugins registered. Discovery failures are
    /// returned unchanged; nothing is registered in that case.
    pub fn load(
        &mut self,
        loader: &dyn PluginLoader,
        path: &Path,
        session: &SessionHandle,
    ) -> PluginResult<usize> {
        let descriptors = loader.discover(path)?;
        debug!(path = %path.display(), count = descriptors.len(), "Loading plugins");

        for descriptor in &descriptors {
            self.register(descriptor, session);
        }
        Ok(descriptors.len())
    }

    /// Runs `init` on every plugin that has not been initialised yet, in
    /// registration order.
    ///
    /// A failing plugin is marked [`PluginState::Failed`] and excluded from
    /// dispatch; the others are unaffected. Returns the number of active
    /// plugins.
    pub fn init_all(&mut self) -> usize {
        for entry in self
            .plugins
            .iter_mut()
            .filter(|entry| entry.state == PluginState::Registered)
        {
            let outcome = match catch_unwind(AssertUnwindSafe(|| entry.plugin.init())) {
                Ok(result) => result,
                Err(payload) => Err(panic_error(payload)),
            };

            match outcome {
                Ok(()) => {
                    entry.state = PluginState::Active;
                    debug!(plugin = %entry.plugin.name(), "Plugin initialised");
                }
                Err(source) => {
                    entry.state = PluginState::Failed;
                    let err = PluginError::Init {
                        plugin: entry.plugin.name().to_string(),
                        source,
                    };
                    error!(error = %err, "Plugin disabled");
                }
            }
        }

        self.active_count()
    }

    /// Hands `message` to every active plugin, in registration order.
    ///
    /// Returns the total number of processor entries that matched.
    pub fn dispatch(&self, message: &mut InboundMessage) -> usize {
        let mut matched = 0;

        for entry in &self.plugins {
            if entry.state != PluginState::Active {
                continue;
            }
            let name = entry.plugin.name();
            let _span = debug_span!("plugin", plugin = %name).entered();

            match catch_unwind(AssertUnwindSafe(|| entry.plugin.process_message(message))) {
                Ok(count) => matched += count,
                Err(payload) => {
                    error!(plugin = %name, error = %panic_error(payload), "Plugin panicked");
                }
            }
        }

        matched
    }

    /// Names of all registered plugins, in order.
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|entry| entry.plugin.name()).collect()
    }

    /// State of the plugin called `name`, if registered.
    pub fn state(&self, name: &str) -> Option<PluginState> {
        self.plugins
            .iter()
            .find(|entry| entry.plugin.name() == name)
            .map(|entry| entry.state)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    fn active_count(&self) -> usize {
        self.plugins
            .iter()
            .filter(|entry| entry.state == PluginState::Active)
            .count()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.plugins
                    .iter()
                    .map(|entry| (entry.plugin.name(), entry.state)),
            )
            .finish()
    }
}
