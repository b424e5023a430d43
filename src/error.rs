use std::fmt;

/// Errors from file-level catalog operations.
///
/// Catalog mutations themselves report failure through their return value; only
/// reading and writing files can produce one of these.
#[derive(Debug)]
pub enum CatalogError {
    /// Error occurred while saving
    PersistenceError(String),
    /// Error occurred while loading
    LoadError(String),
}

impl std::error::Error for CatalogError {}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PersistenceError(msg) => write!(f, "Persistence error: {msg}"),
            Self::LoadError(msg) => write!(f, "Load error: {msg}"),
        }
    }
}
