//! Plugin discovery.
//!
//! A [`PluginLoader`] maps a path to an ordered list of descriptors. The
//! registry never looks at the filesystem itself.
//!
//! [`CatalogLoader`] resolves names against the compiled-in catalog. A plugin
//! directory is read in one of two ways:
//!
//! ```text
//! plugins/                      plugins/
//! ├── plugins.toml              ├── greeter/
//! │   plugins = ["a", "b"]      ├── standup/
//! └── ...                       │   └── plugin.toml   name = "daily-standup"
//!                               └── notes.txt         (ignored, not a directory)
//!   explicit export               one plugin per subdirectory
//! ```
//!
//! With a `plugins.toml`, its list is the export, in list order, and naming an
//! unknown plugin is an error. Without one, every subdirectory is a candidate
//! (sorted by name); candidates that do not resolve are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Format, Toml};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{PluginDescriptor, catalog};
use crate::error::{PluginError, PluginResult};

/// File naming the plugins a directory exports, in order.
pub const EXPORT_MANIFEST: &str = "plugins.toml";

/// Optional per-plugin manifest inside a plugin subdirectory.
pub const PLUGIN_MANIFEST: &str = "plugin.toml";

/// Maps a path to the plugins it exports.
pub trait PluginLoader {
    /// Returns descriptors in registration order.
    ///
    /// An unreadable path is an error; individual invalid candidates are not.
    fn discover(&self, path: &Path) -> PluginResult<Vec<PluginDescriptor>>;
}

#[derive(Debug, Deserialize)]
struct ExportManifest {
    plugins: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PluginManifest {
    #[serde(default)]
    name: Option<String>,
}

fn read_manifest<T>(path: &Path) -> PluginResult<T>
where
    T: for<'de> Deserialize<'de>,
{
    Figment::from(Toml::file(path))
        .extract()
        .map_err(|e| PluginError::Manifest {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Resolves plugin names against a catalog of descriptors.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    catalog: Vec<PluginDescriptor>,
}

impl Default for CatalogLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogLoader {
    /// Uses the global catalog filled by [`export_plugin!`](crate::export_plugin).
    pub fn new() -> Self {
        Self::with_catalog(catalog::catalog().to_vec())
    }

    /// Uses the given descriptors instead of the global catalog.
    pub fn with_catalog(catalog: Vec<PluginDescriptor>) -> Self {
        Self { catalog }
    }

    fn resolve(&self, name: &str) -> Option<PluginDescriptor> {
        self.catalog.iter().find(|desc| desc.name == name).copied()
    }

    fn discover_explicit(&self, manifest: &Path) -> PluginResult<Vec<PluginDescriptor>> {
        let export: ExportManifest = read_manifest(manifest)?;
        debug!(manifest = %manifest.display(), plugins = ?export.plugins, "Using explicit plugin export");

        export
            .plugins
            .iter()
            .map(|name| {
                self.resolve(name)
                    .ok_or_else(|| PluginError::UnknownPlugin(name.clone()))
            })
            .collect()
    }

    fn candidate_name(dir: &Path) -> PluginResult<Option<String>> {
        let manifest = dir.join(PLUGIN_MANIFEST);
        if manifest.is_file() {
            let manifest: PluginManifest = read_manifest(&manifest)?;
            if manifest.name.is_some() {
                return Ok(manifest.name);
            }
        }
        Ok(dir
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string))
    }
}

impl PluginLoader for CatalogLoader {
    fn discover(&self, path: &Path) -> PluginResult<Vec<PluginDescriptor>> {
        let discovery_error = |source| PluginError::Discovery {
            path: path.to_path_buf(),
            source,
        };

        let entries = fs::read_dir(path).map_err(discovery_error)?;

        let manifest = path.join(EXPORT_MANIFEST);
        if manifest.is_file() {
            return self.discover_explicit(&manifest);
        }

        let mut dirs: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(discovery_error)?;
            if entry.file_type().map_err(discovery_error)?.is_dir() {
                dirs.push(entry.path());
            }
        }
        dirs.sort();

        let mut found = Vec::new();
        for dir in dirs {
            let name = match Self::candidate_name(&dir) {
                Ok(Some(name)) => name,
                Ok(None) => {
                    warn!(dir = %dir.display(), "Skipping plugin directory with a non UTF-8 name");
                    continue;
                }
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Skipping plugin directory");
                    continue;
                }
            };

            match self.resolve(&name) {
                Some(desc) => {
                    debug!(dir = %dir.display(), plugin = desc.name, "Discovered plugin");
                    found.push(desc);
                }
                None => {
                    warn!(dir = %dir.display(), plugin = %name, "Skipping directory without a matching plugin");
                }
            }
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::Plugin;
    use crate::processor::MessageProcessor;
    use crate::session::SessionHandle;

    struct Named(&'static str, MessageProcessor);

    impl Plugin for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn processor(&self) -> &MessageProcessor {
            &self.1
        }
    }

    fn alpha(_: SessionHandle) -> Box<dyn Plugin> {
        Box::new(Named("alpha", MessageProcessor::new()))
    }

    fn beta(_: SessionHandle) -> Box<dyn Plugin> {
        Box::new(Named("beta", MessageProcessor::new()))
    }

    fn loader() -> CatalogLoader {
        CatalogLoader::with_catalog(vec![
            PluginDescriptor::new("alpha", alpha),
            PluginDescriptor::new("beta", beta),
        ])
    }

    fn names(found: &[PluginDescriptor]) -> Vec<&'static str> {
        found.iter().map(|d| d.name).collect()
    }

    #[test]
    fn test_unreadable_path_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let err = loader().discover(&missing).unwrap_err();
        assert!(matches!(err, PluginError::Discovery { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_subdirectories_sorted_and_invalid_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("beta")).unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::create_dir(dir.path().join("unknown")).unwrap();
        fs::write(dir.path().join("alpha.txt"), "not a plugin").unwrap();

        let broken = dir.path().join("broken");
        fs::create_dir(&broken).unwrap();
        fs::write(broken.join(PLUGIN_MANIFEST), "name = [").unwrap();

        let found = loader().discover(dir.path()).unwrap();
        assert_eq!(names(&found), ["alpha", "beta"]);
    }

    #[test]
    fn test_plugin_manifest_overrides_directory_name() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("first");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join(PLUGIN_MANIFEST), "name = \"beta\"\n").unwrap();

        let found = loader().discover(dir.path()).unwrap();
        assert_eq!(names(&found), ["beta"]);
    }

    #[test]
    fn test_explicit_export_keeps_list_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::write(
            dir.path().join(EXPORT_MANIFEST),
            "plugins = [\"beta\", \"alpha\"]\n",
        )
        .unwrap();

        let found = loader().discover(dir.path()).unwrap();
        assert_eq!(names(&found), ["beta", "alpha"]);
    }

    #[test]
    fn test_explicit_export_with_unknown_name_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(EXPORT_MANIFEST), "plugins = [\"gamma\"]\n").unwrap();

        let err = loader().discover(dir.path()).unwrap_err();
        assert!(matches!(err, PluginError::UnknownPlugin(ref name) if name == "gamma"));
    }

    #[test]
    fn test_explicit_and_directory_discovery_agree_for_one_plugin() {
        let explicit = tempfile::tempdir().unwrap();
        fs::write(explicit.path().join(EXPORT_MANIFEST), "plugins = [\"alpha\"]\n").unwrap();

        let by_dir = tempfile::tempdir().unwrap();
        fs::create_dir(by_dir.path().join("alpha")).unwrap();

        let loader = loader();
        assert_eq!(
            names(&loader.discover(explicit.path()).unwrap()),
            names(&loader.discover(by_dir.path()).unwrap()),
        );
    }
}
