/// Exports a [`PluginDescriptor`] into the plugin catalog.
///
/// Exported plugins can be named in a `plugins.toml` manifest or found by
/// directory discovery.
///
/// ```rust,ignore
/// lychii::export_plugin!(PING = PluginDescriptor::new("ping", Ping::create));
/// ```
///
/// [`PluginDescriptor`]: crate::plugin::PluginDescriptor
#[macro_export]
macro_rules! export_plugin {
    ($(#[$meta:meta])* $vis:vis $ident:ident = $desc:expr $(;)?) => {
        $(#[$meta])*
        #[$crate::__linkme::distributed_slice($crate::plugin::PLUGIN_CATALOG)]
        #[linkme(crate = $crate::__linkme)]
        $vis static $ident: $crate::plugin::PluginDescriptor = $desc;
    };
}
