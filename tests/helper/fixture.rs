//! Module directory fixtures

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use tempfile::TempDir;
use zip::ZipArchive;

pub const EXAMPLE_MODULE: &str = "github.com/mercari/example";
pub const EXAMPLE_VERSION: &str = "v0.2.0";
pub const EXAMPLE_GO_MOD: &str = "module github.com/mercari/example\n\ngo 1.16\n";
pub const EXAMPLE_SOURCE: &str = "package example\n\nconst Name = \"example\"\n";

/// Create a module directory with the given files, relative to its root
pub fn create_module_tree(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (path, content) in files {
        write_file(temp_dir.path(), path, content);
    }
    temp_dir
}

/// Create the example module directory:
///
/// ```text
/// github.com/mercari/example@v0.2.0/go.mod
/// github.com/mercari/example@v0.2.0/example.go
/// github.com/mercari/example@badver/go.mod
/// ```
pub fn create_example_tree() -> TempDir {
    create_module_tree(&[
        ("github.com/mercari/example@v0.2.0/go.mod", EXAMPLE_GO_MOD),
        ("github.com/mercari/example@v0.2.0/example.go", EXAMPLE_SOURCE),
        ("github.com/mercari/example@badver/go.mod", EXAMPLE_GO_MOD),
    ])
}

pub fn write_file(base: &Path, path: &str, content: impl AsRef<[u8]>) {
    let path = base.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Bytes that deflate cannot shrink, so archives stay as large as the input
pub fn incompressible_bytes(len: usize) -> Vec<u8> {
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 56) as u8
        })
        .collect()
}

/// Read every member of a zip archive as (name, raw bytes)
pub fn zip_binary_members(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut content = Vec::new();
            file.read_to_end(&mut content).unwrap();
            (file.name().to_string(), content)
        })
        .collect()
}

/// Read every member of a zip archive as (name, content)
pub fn zip_members(bytes: &[u8]) -> Vec<(String, String)> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut content = String::new();
            file.read_to_string(&mut content).unwrap();
            (file.name().to_string(), content)
        })
        .collect()
}
