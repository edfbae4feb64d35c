//! Parsing of module-proxy request paths
//!
//! Supported paths:
//! - `/<module>/@v/list`
//! - `/<module>/@v/<version>.info`
//! - `/<module>/@v/<version>.mod`
//! - `/<module>/@v/<version>.zip`
//!
//! The path is percent-decoded before matching. Module paths and versions
//! are then case-decoded: uppercase letters are sent as `!` followed by the
//! lowercase letter (github.com/Azure -> github.com/!azure).

use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::module::error::ModuleError;

/// A decoded module-proxy request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyRequest {
    List { module: String },
    Info { module: String, version: String },
    Mod { module: String, version: String },
    Zip { module: String, version: String },
}

pub struct RequestParser {
    /// Regex for query paths: `<module>/@v/list` or `<module>/@v/<version>.<ext>`
    query_re: Regex,
}

impl RequestParser {
    pub fn new() -> Self {
        Self {
            query_re: Regex::new(
                r"^/?(?P<module>.+)/@v/(?:(?P<list>list)|(?P<version>.+)\.(?P<ext>info|mod|zip))$",
            )
            .expect("query pattern is valid"),
        }
    }

    /// Parses a request path as received on the wire.
    ///
    /// # Returns
    /// * `Ok(Some(request))` - A recognized query
    /// * `Ok(None)` - The path is not a module-proxy query
    /// * `Err(ModuleError::NotFound)` - The path does not decode to UTF-8, or
    ///   the module path or version is not validly case-encoded
    pub fn parse(&self, raw_path: &str) -> Result<Option<ProxyRequest>, ModuleError> {
        let path = percent_decode_str(raw_path).decode_utf8().map_err(|_| {
            ModuleError::NotFound(format!("invalid escaped path \"{}\"", raw_path))
        })?;

        let Some(captures) = self.query_re.captures(&path) else {
            return Ok(None);
        };

        let module = decode_path(&captures["module"])?;
        if captures.name("list").is_some() {
            return Ok(Some(ProxyRequest::List { module }));
        }

        let version = decode_path(&captures["version"])?;
        let request = match &captures["ext"] {
            "info" => ProxyRequest::Info { module, version },
            "mod" => ProxyRequest::Mod { module, version },
            _ => ProxyRequest::Zip { module, version },
        };
        Ok(Some(request))
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes a case-encoded module path or version.
/// `!{lowercase}` becomes the uppercase letter; a bare uppercase letter or a
/// `!` not followed by a lowercase letter is invalid.
pub fn decode_path(encoded: &str) -> Result<String, ModuleError> {
    let invalid = || ModuleError::NotFound(format!("invalid escaped path \"{}\"", encoded));

    let mut result = String::with_capacity(encoded.len());
    let mut chars = encoded.chars();
    while let Some(c) = chars.next() {
        match c {
            '!' => match chars.next() {
                Some(next) if next.is_ascii_lowercase() => result.push(next.to_ascii_uppercase()),
                _ => return Err(invalid()),
            },
            c if c.is_ascii_uppercase() => return Err(invalid()),
            c => result.push(c),
        }
    }
    Ok(result)
}
