//! Store trait for resolving modules against a module collection

use std::path::PathBuf;

#[cfg(test)]
use mockall::automock;

use crate::module::cancel::Cancellation;
use crate::module::error::ModuleError;
use crate::module::types::Module;

/// Trait for looking up modules and their files
#[cfg_attr(test, automock)]
pub trait ModuleStore: Send + Sync + 'static {
    /// Resolves a module path to the module and its valid versions
    ///
    /// # Returns
    /// * `Ok(Module)` - Module with at least one version
    /// * `Err(ModuleError::NotFound)` - Malformed path, missing parent directory,
    ///   or no valid versions
    fn resolve_by_path(&self, path: &str, cancel: &Cancellation) -> Result<Module, ModuleError>;

    /// Loads the manifest (go.mod) of the given module version
    ///
    /// Does not check that `version` belongs to `module`.
    fn load_manifest(
        &self,
        module: &Module,
        version: &str,
        cancel: &Cancellation,
    ) -> Result<Vec<u8>, ModuleError>;

    /// Returns the base directory of the collection and the directory of the
    /// module version
    fn resolve_paths(&self, module: &Module, version: &str) -> (PathBuf, PathBuf);
}
