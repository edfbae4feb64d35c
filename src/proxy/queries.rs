//! The four module-proxy queries: list, info, mod and zip

use std::io::Write;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::module::archive::write_archive;
use crate::module::cancel::Cancellation;
use crate::module::error::ModuleError;
use crate::module::store::ModuleStore;
use crate::module::types::Module;

/// Response of an info query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    #[serde(rename = "Version")]
    pub version: String,
}

/// Trait for answering module-proxy queries
pub trait ProxyQueries: Send + Sync + 'static {
    /// Lists the versions of a module in discovery order
    fn list_versions(
        &self,
        path: &str,
        cancel: &Cancellation,
    ) -> Result<Vec<String>, ModuleError>;

    /// Returns metadata for a module version
    fn info(
        &self,
        path: &str,
        version: &str,
        cancel: &Cancellation,
    ) -> Result<VersionInfo, ModuleError>;

    /// Returns the go.mod file of a module version
    fn manifest(
        &self,
        path: &str,
        version: &str,
        cancel: &Cancellation,
    ) -> Result<String, ModuleError>;

    /// Writes the zip archive of a module version to `dst`
    fn archive(
        &self,
        path: &str,
        version: &str,
        dst: &mut dyn Write,
        cancel: &Cancellation,
    ) -> Result<(), ModuleError>;
}

/// [`ProxyQueries`] backed by a [`ModuleStore`]
pub struct ModuleProxy<S: ModuleStore> {
    store: S,
}

impl<S: ModuleStore> ModuleProxy<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolves the module and checks that it carries `version`
    fn resolve_version(
        &self,
        path: &str,
        version: &str,
        cancel: &Cancellation,
    ) -> Result<Module, ModuleError> {
        let module = self.store.resolve_by_path(path, cancel)?;
        if !module.has_version(version) {
            return Err(ModuleError::unknown_revision(path, version));
        }
        Ok(module)
    }
}

impl<S: ModuleStore> ProxyQueries for ModuleProxy<S> {
    fn list_versions(
        &self,
        path: &str,
        cancel: &Cancellation,
    ) -> Result<Vec<String>, ModuleError> {
        let module = self.store.resolve_by_path(path, cancel)?;
        Ok(module.versions)
    }

    fn info(
        &self,
        path: &str,
        version: &str,
        cancel: &Cancellation,
    ) -> Result<VersionInfo, ModuleError> {
        self.resolve_version(path, version, cancel)?;
        Ok(VersionInfo {
            version: version.to_string(),
        })
    }

    fn manifest(
        &self,
        path: &str,
        version: &str,
        cancel: &Cancellation,
    ) -> Result<String, ModuleError> {
        let module = self.resolve_version(path, version, cancel)?;
        let content = self.store.load_manifest(&module, version, cancel)?;

        String::from_utf8(content).map_err(|e| {
            ModuleError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }

    fn archive(
        &self,
        path: &str,
        version: &str,
        dst: &mut dyn Write,
        cancel: &Cancellation,
    ) -> Result<(), ModuleError> {
        let module = self.resolve_version(path, version, cancel)?;
        let (base_dir, version_dir) = self.store.resolve_paths(&module, version);

        debug!("Archiving {}@{} from {:?}", path, version, version_dir);
        write_archive(&base_dir, &version_dir, dst, cancel)
    }
}
