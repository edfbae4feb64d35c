//! Module zip archive creation
//!
//! Every regular file under a version directory becomes one archive member,
//! named relative to the base directory so the `<module>@<version>/` prefix
//! is kept:
//!
//! ```text
//! github.com/mercari/example@v0.2.0/go.mod
//! github.com/mercari/example@v0.2.0/sub/b.txt
//! ```
//!
//! Directories produce no members. Entries are visited in file-name order and
//! written with a fixed timestamp, so an unchanged tree always yields the same
//! bytes.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Component, Path};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::module::cancel::Cancellation;
use crate::module::error::ModuleError;

/// Buffer size used when copying file contents into the archive
const COPY_BUFFER_SIZE: usize = 32 * 1024;

/// Largest member size representable without ZIP64 extensions
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// Writes a zip archive of `version_dir` to `dst`.
///
/// The sink does not need to support seeking. On error the bytes already
/// written to `dst` do not form a valid archive.
pub fn write_archive<W: Write>(
    base_dir: &Path,
    version_dir: &Path,
    dst: W,
    cancel: &Cancellation,
) -> Result<(), ModuleError> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut zip = ZipWriter::new_stream(dst);
    let count = add_dir_to_zip(&mut zip, base_dir, version_dir, options, cancel)?;

    let mut inner = zip.finish()?;
    inner.flush()?;

    debug!("Archived {} files from {:?}", count, version_dir);
    Ok(())
}

fn add_dir_to_zip<W: Write + io::Seek>(
    zip: &mut ZipWriter<W>,
    base_dir: &Path,
    dir: &Path,
    options: SimpleFileOptions,
    cancel: &Cancellation,
) -> Result<usize, ModuleError> {
    let mut entries = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut count = 0;
    for entry in entries {
        cancel.check()?;

        let path = entry.path();
        if entry.file_type()?.is_dir() {
            count += add_dir_to_zip(zip, base_dir, &path, options, cancel)?;
            continue;
        }

        // Regular files and symlinks alike are read through
        let mut file = File::open(&path)?;
        let size = file.metadata()?.len();
        let name = archive_name(base_dir, &path)?;
        zip.start_file(name.as_str(), options.large_file(needs_zip64(size)))?;
        copy_with_cancel(&mut file, zip, cancel)?;
        count += 1;
    }

    Ok(count)
}

/// Members at or above 4 GiB must be written with ZIP64 headers
fn needs_zip64(size: u64) -> bool {
    size >= ZIP64_THRESHOLD
}

/// Returns the `/`-separated path of `path` relative to `base_dir`.
fn archive_name(base_dir: &Path, path: &Path) -> Result<String, ModuleError> {
    let relative = path.strip_prefix(base_dir).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{:?} is not under {:?}", path, base_dir),
        )
    })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        let Component::Normal(segment) = component else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unexpected component in {:?}", relative),
            )
            .into());
        };
        let segment = segment.to_str().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("file name is not valid UTF-8: {:?}", relative),
            )
        })?;
        segments.push(segment);
    }

    Ok(segments.join("/"))
}

fn copy_with_cancel<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    cancel: &Cancellation,
) -> Result<u64, ModuleError> {
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut copied = 0u64;
    loop {
        cancel.check()?;
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(copied),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        writer.write_all(&buf[..n])?;
        copied += n as u64;
    }
}
