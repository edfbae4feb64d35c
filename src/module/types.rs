/// A module and the versions discovered for it on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Slash-separated module path (e.g., "github.com/mercari/example")
    pub path: String,
    /// Versions in discovery order
    pub versions: Vec<String>,
}

impl Module {
    pub fn new(path: impl Into<String>, versions: Vec<String>) -> Self {
        Self {
            path: path.into(),
            versions,
        }
    }

    /// Returns true if `version` matches one of the discovered versions exactly
    pub fn has_version(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("v0.2.0", true)]
    #[case("v0.1.0", true)]
    #[case("v0.3.0", false)]
    #[case("V0.2.0", false)] // case differs
    #[case(" v0.2.0", false)] // extra whitespace
    #[case("v0.2.0\n", false)]
    #[case("", false)]
    fn has_version_requires_exact_match(#[case] version: &str, #[case] expected: bool) {
        let module = Module::new(
            "github.com/mercari/example",
            vec!["v0.1.0".to_string(), "v0.2.0".to_string()],
        );

        assert_eq!(module.has_version(version), expected);
    }
}
