//! Plugin system.
//!
//! - [`Plugin`]: the trait every plugin implements.
//! - [`PluginDescriptor`]: static handle used to instantiate a plugin.
//! - [`PLUGIN_CATALOG`] and [`export_plugin!`](crate::export_plugin): the
//!   link-time catalog of compiled-in plugins.
//! - [`PluginLoader`] / [`CatalogLoader`]: discovery from a plugin directory.
//! - [`PluginRegistry`]: ordered, two-phase (register, then init) collection.

#[cfg(feature = "builtin")]
pub mod builtin;
mod catalog;
mod core;
mod descriptor;
mod loader;
mod macros;
mod registry;

pub use catalog::{PLUGIN_CATALOG, catalog, find};
pub use self::core::Plugin;
pub use descriptor::PluginDescriptor;
pub use loader::{CatalogLoader, EXPORT_MANIFEST, PLUGIN_MANIFEST, PluginLoader};
pub use registry::{PluginRegistry, PluginState};
