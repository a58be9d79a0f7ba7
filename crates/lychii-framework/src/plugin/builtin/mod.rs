//! Plugins registered before the user plugin directory.

mod greeter;

pub use greeter::{GREETER, Greeter};

use super::PluginDescriptor;

/// Built-in plugins, in registration order.
pub fn descriptors() -> [PluginDescriptor; 1] {
    [GREETER]
}
