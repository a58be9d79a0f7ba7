//! Plugin descriptor: the static, `Copy` handle to a plugin.

use super::Plugin;
use crate::session::SessionHandle;

/// Identifies a plugin and knows how to build it.
///
/// Descriptors are usually exported into the plugin catalog with
/// [`export_plugin!`](crate::export_plugin), where directory discovery can
/// find them by name.
#[derive(Debug, Clone, Copy)]
pub struct PluginDescriptor {
    /// Name used by directory discovery and manifests.
    pub name: &'static str,

    /// One-line description shown in logs.
    pub desc: &'static str,

    /// Builds the live plugin for a session.
    pub create: fn(SessionHandle) -> Box<dyn Plugin>,
}

impl PluginDescriptor {
    pub const fn new(name: &'static str, create: fn(SessionHandle) -> Box<dyn Plugin>) -> Self {
        Self {
            name,
            desc: "",
            create,
        }
    }

    /// Sets the description.
    pub const fn with_desc(mut self, desc: &'static str) -> Self {
        self.desc = desc;
        self
    }

    /// Creates the live plugin.
    #[inline]
    pub fn instantiate(&self, session: SessionHandle) -> Box<dyn Plugin> {
        (self.create)(session)
    }
}
