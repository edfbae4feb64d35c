//! Filesystem-backed module store
//!
//! Module versions live in directories named `<name>@<version>` under the
//! parent of the module path:
//!
//! ```text
//! <base>/github.com/mercari/example@v0.1.0/go.mod
//! <base>/github.com/mercari/example@v0.2.0/go.mod
//! ```

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::module::cancel::Cancellation;
use crate::module::error::ModuleError;
use crate::module::store::ModuleStore;
use crate::module::types::Module;
use crate::module::version::is_valid_version;

/// File name of the module manifest inside a version directory
pub const MANIFEST_FILE: &str = "go.mod";

/// Module store reading pre-extracted module versions from a base directory
#[derive(Debug, Clone)]
pub struct FsModuleRepository {
    base_dir: PathBuf,
}

impl FsModuleRepository {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: clean_path(base_dir.as_ref()),
        }
    }

    fn version_dir(&self, module: &Module, version: &str) -> PathBuf {
        self.base_dir.join(format!("{}@{}", module.path, version))
    }
}

impl ModuleStore for FsModuleRepository {
    fn resolve_by_path(&self, path: &str, cancel: &Cancellation) -> Result<Module, ModuleError> {
        let Some((parent, name)) = split_module_path(path) else {
            return Err(ModuleError::NotFound(format!(
                "invalid import path \"{}\"",
                path
            )));
        };

        cancel.check()?;

        let parent_dir = self.base_dir.join(parent);
        let entries = match fs::read_dir(&parent_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ModuleError::NotFound(format!(
                    "module \"{}\" not found",
                    path
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = entries.collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        let mut versions = Vec::new();
        for entry in entries {
            cancel.check()?;

            let file_name = entry.file_name();
            let Some((entry_module, entry_version)) =
                file_name.to_str().and_then(|name| name.split_once('@'))
            else {
                continue;
            };

            if entry_module != name || !is_valid_version(entry_version) {
                continue;
            }

            if entry.file_type()?.is_dir() {
                versions.push(entry_version.to_string());
            }
        }

        if versions.is_empty() {
            return Err(ModuleError::NotFound(format!(
                "module \"{}\" does not have any valid versions",
                path
            )));
        }

        debug!("Resolved module {} with versions {:?}", path, versions);
        Ok(Module::new(path, versions))
    }

    fn load_manifest(
        &self,
        module: &Module,
        version: &str,
        cancel: &Cancellation,
    ) -> Result<Vec<u8>, ModuleError> {
        cancel.check()?;

        let manifest = self.version_dir(module, version).join(MANIFEST_FILE);
        match fs::read(&manifest) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ModuleError::NotFound(format!(
                "module \"{}\" has no {} at {}",
                module.path, MANIFEST_FILE, version
            ))),
            Err(e) => Err(e.into()),
        }
    }

    fn resolve_paths(&self, module: &Module, version: &str) -> (PathBuf, PathBuf) {
        (self.base_dir.clone(), self.version_dir(module, version))
    }
}

/// Splits a module path into its parent path and last segment.
///
/// Returns None for single-segment paths and for paths that could escape the
/// base directory (absolute, empty, `.` or `..` segments).
fn split_module_path(path: &str) -> Option<(&str, &str)> {
    let valid_segments = path.split('/').all(|segment| {
        !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('\\')
    });
    if !valid_segments {
        return None;
    }

    path.rsplit_once('/')
}

/// Lexically normalizes a path: drops `.` segments and folds `..` into the
/// preceding segment where possible.
fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => cleaned.push(".."),
            },
            other => cleaned.push(other.as_os_str()),
        }
    }

    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn create_version_dir(base: &Path, dir: &str) {
        let version_dir = base.join(dir);
        fs::create_dir_all(&version_dir).unwrap();
        fs::write(version_dir.join(MANIFEST_FILE), format!("module {}\n", dir)).unwrap();
    }

    fn setup_repository(dirs: &[&str]) -> (TempDir, FsModuleRepository) {
        let temp_dir = TempDir::new().unwrap();
        for dir in dirs {
            create_version_dir(temp_dir.path(), dir);
        }
        let repository = FsModuleRepository::new(temp_dir.path());
        (temp_dir, repository)
    }

    #[test]
    fn resolve_by_path_returns_versions_in_name_order() {
        let (_temp_dir, repository) = setup_repository(&[
            "github.com/mercari/example@v0.2.0",
            "github.com/mercari/example@v0.1.0",
            "github.com/mercari/example@v0.10.0",
        ]);

        let module = repository
            .resolve_by_path("github.com/mercari/example", &Cancellation::new())
            .unwrap();

        assert_eq!(module.path, "github.com/mercari/example");
        assert_eq!(module.versions, vec!["v0.1.0", "v0.10.0", "v0.2.0"]);
    }

    #[test]
    fn resolve_by_path_skips_invalid_and_foreign_entries() {
        let (temp_dir, repository) = setup_repository(&[
            "github.com/mercari/example@v0.2.0",
            "github.com/mercari/example@badver",
            "github.com/mercari/example@v1.0.0+build",
            "github.com/mercari/example-other@v0.3.0",
            "github.com/mercari/example",
        ]);
        // A regular file named like a version is not a version directory
        fs::write(
            temp_dir.path().join("github.com/mercari/example@v0.4.0"),
            "not a directory",
        )
        .unwrap();

        let module = repository
            .resolve_by_path("github.com/mercari/example", &Cancellation::new())
            .unwrap();

        assert_eq!(module.versions, vec!["v0.2.0"]);
    }

    #[test]
    fn resolve_by_path_accepts_incompatible_versions() {
        let (_temp_dir, repository) = setup_repository(&[
            "github.com/mercari/example@v2.0.0+incompatible",
        ]);

        let module = repository
            .resolve_by_path("github.com/mercari/example", &Cancellation::new())
            .unwrap();

        assert_eq!(module.versions, vec!["v2.0.0+incompatible"]);
    }

    #[rstest]
    #[case("github")]
    #[case("")]
    #[case("/github.com")]
    #[case("github.com/")]
    #[case("github.com//example")]
    #[case("../github.com/mercari/example")]
    #[case("github.com/mercari/../mercari/example")]
    #[case("./github.com/example")]
    fn resolve_by_path_rejects_malformed_paths(#[case] path: &str) {
        let (_temp_dir, repository) = setup_repository(&["github.com/mercari/example@v0.2.0"]);

        let result = repository.resolve_by_path(path, &Cancellation::new());

        assert!(matches!(result, Err(ModuleError::NotFound(_))));
    }

    #[test]
    fn resolve_by_path_returns_not_found_for_missing_parent() {
        let (_temp_dir, repository) = setup_repository(&["github.com/mercari/example@v0.2.0"]);

        let err = repository
            .resolve_by_path("gitlab.com/mercari/example", &Cancellation::new())
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "not found: module \"gitlab.com/mercari/example\" not found"
        );
    }

    #[test]
    fn resolve_by_path_returns_not_found_without_valid_versions() {
        let (_temp_dir, repository) = setup_repository(&[
            "github.com/mercari/example@v0.2.0",
            "github.com/mercari/badexample@badver",
        ]);

        let err = repository
            .resolve_by_path("github.com/mercari/badexample", &Cancellation::new())
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "not found: module \"github.com/mercari/badexample\" does not have any valid versions"
        );
    }

    #[test]
    fn resolve_by_path_honors_cancellation() {
        let (_temp_dir, repository) = setup_repository(&["github.com/mercari/example@v0.2.0"]);
        let cancel = Cancellation::new();
        cancel.cancel();

        let result = repository.resolve_by_path("github.com/mercari/example", &cancel);

        assert!(matches!(result, Err(ModuleError::Cancelled)));
    }

    #[test]
    fn load_manifest_reads_go_mod() {
        let (_temp_dir, repository) = setup_repository(&["github.com/mercari/example@v0.2.0"]);
        let module = Module::new("github.com/mercari/example", vec!["v0.2.0".to_string()]);

        let manifest = repository
            .load_manifest(&module, "v0.2.0", &Cancellation::new())
            .unwrap();

        assert_eq!(manifest, b"module github.com/mercari/example@v0.2.0\n");
    }

    #[test]
    fn load_manifest_returns_not_found_for_missing_file() {
        let (_temp_dir, repository) = setup_repository(&["github.com/mercari/example@v0.2.0"]);
        let module = Module::new("github.com/mercari/example", vec!["v0.2.0".to_string()]);

        let result = repository.load_manifest(&module, "v0.3.0", &Cancellation::new());

        assert!(matches!(result, Err(ModuleError::NotFound(_))));
    }

    #[test]
    fn resolve_paths_joins_module_path_and_version() {
        let repository = FsModuleRepository::new("/srv/modules/./");
        let module = Module::new("github.com/mercari/example", vec!["v0.2.0".to_string()]);

        let (base_dir, version_dir) = repository.resolve_paths(&module, "v0.2.0");

        assert_eq!(base_dir, PathBuf::from("/srv/modules"));
        assert_eq!(
            version_dir,
            PathBuf::from("/srv/modules/github.com/mercari/example@v0.2.0")
        );
    }

    #[rstest]
    #[case("/srv/modules", "/srv/modules")]
    #[case("/srv/modules/", "/srv/modules")]
    #[case("/srv/./modules", "/srv/modules")]
    #[case("/srv/cache/../modules", "/srv/modules")]
    #[case("/..", "/")]
    #[case("modules/..", ".")]
    #[case("../modules", "../modules")]
    #[case(".", ".")]
    fn clean_path_normalizes_lexically(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clean_path(Path::new(input)), PathBuf::from(expected));
    }
}
