use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,
}

impl ModuleError {
    /// Build a NotFound error for a version the module does not carry
    pub fn unknown_revision(path: &str, version: &str) -> Self {
        Self::NotFound(format!("\"{}\": unknown revision {}", path, version))
    }

    /// Returns true for errors a client should see as "gone"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true if the operation was aborted by cancellation or deadline
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}
