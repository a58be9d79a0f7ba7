//! Link-time catalog of compiled-in plugins.
//!
//! Every crate linked into the binary can contribute descriptors with
//! [`export_plugin!`](crate::export_plugin). Discovery resolves plugin names
//! against this catalog instead of loading code from disk.

use linkme::distributed_slice;

use super::PluginDescriptor;

/// All descriptors exported with [`export_plugin!`](crate::export_plugin).
#[distributed_slice]
pub static PLUGIN_CATALOG: [PluginDescriptor];

/// Returns every exported descriptor. Order is unspecified.
pub fn catalog() -> &'static [PluginDescriptor] {
    &PLUGIN_CATALOG
}

/// Looks an exported descriptor up by name.
pub fn find(name: &str) -> Option<&'static PluginDescriptor> {
    PLUGIN_CATALOG.iter().find(|desc| desc.name == name)
}
