//! Go module version validation
//!
//! Go module versions are semantic versions with a mandatory `v` prefix:
//! - Full form: v1.2.3, v1.2.3-pre.1, v2.0.0+incompatible
//! - Shorthand: v1, v1.2 (no prerelease or build metadata allowed)
//!
//! The only build metadata a module version may carry is `+incompatible`.

use semver::Version;

/// Build metadata accepted on module versions
const INCOMPATIBLE: &str = "incompatible";

/// Returns true if `version` is a well-formed module version.
pub fn is_valid_version(version: &str) -> bool {
    let Some(parsed) = parse_module_version(version) else {
        return false;
    };

    parsed.build.is_empty() || parsed.build.as_str() == INCOMPATIBLE
}

/// Parse a `v`-prefixed module version into a semver::Version.
///
/// The numeric core is checked by hand and replaced with `0.0.0` before the
/// prerelease and build suffix is parsed, so components larger than `u64`
/// are accepted. The returned value only carries the suffix.
fn parse_module_version(version: &str) -> Option<Version> {
    let rest = version.strip_prefix('v')?;

    let core_end = rest.find(['-', '+']).unwrap_or(rest.len());
    let (core, suffix) = rest.split_at(core_end);
    let parts: Vec<&str> = core.split('.').collect();

    match parts.len() {
        // Shorthand forms never carry a suffix
        1 | 2 if !suffix.is_empty() => return None,
        1..=3 => {}
        _ => return None,
    }
    if !parts.iter().all(|part| is_numeric_identifier(part)) {
        return None;
    }

    Version::parse(&format!("0.0.0{}", suffix)).ok()
}

/// Digits only, without a leading zero unless the number is zero
fn is_numeric_identifier(part: &str) -> bool {
    !part.is_empty()
        && part.bytes().all(|b| b.is_ascii_digit())
        && (part == "0" || !part.starts_with('0'))
}
