//! Reading and writing catalog files.
//!
//! Books are stored one per line in the format of [`Book::to_line`]. A JSON snapshot
//! additionally carries users and what they have borrowed.

use std::{
    fs::{self, File},
    io::Write,
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{book::Book, error::CatalogError, user::User};

/// Everything the catalog owns, in catalog order
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogSnapshot {
    /// Books in catalog order
    pub books: Vec<Book>,
    /// Users in registration order
    pub users: Vec<User>,
}

/// Join books into catalog file contents, one newline-terminated line each
#[must_use]
pub fn encode_books(books: &[Book]) -> String {
    books.iter().map(|book| book.to_line() + "\n").collect()
}

/// Split catalog file contents into books.
///
/// Blank lines are skipped and a trailing `\r` is stripped. Every other line yields a
/// book, however malformed.
#[must_use]
pub fn decode_books(contents: &str) -> Vec<Book> {
    contents
        .lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(Book::from_line)
        .collect()
}

/// Write `books` to `path`, replacing its contents
///
/// # Errors
///
/// Returns a `CatalogError::PersistenceError` if the file cannot be created or written
pub fn save_books(path: impl AsRef<Path>, books: &[Book]) -> Result<(), CatalogError> {
    let path = path.as_ref();
    let mut file = File::create(path)
        .map_err(|e| CatalogError::PersistenceError(format!("Failed to create file: {e}")))?;

    file.write_all(encode_books(books).as_bytes())
        .map_err(|e| CatalogError::PersistenceError(format!("Failed to write to file: {e}")))?;

    Ok(())
}

/// Read all books stored at `path`
///
/// # Errors
///
/// Returns a `CatalogError::LoadError` if the file does not exist or cannot be read
pub fn load_books(path: impl AsRef<Path>) -> Result<Vec<Book>, CatalogError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CatalogError::LoadError(format!("File does not exist: {}", path.display())));
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| CatalogError::LoadError(format!("Failed to read file: {e}")))?;

    Ok(decode_books(&contents))
}

/// Write a snapshot to `path` as pretty-printed JSON
///
/// # Errors
///
/// Returns a `CatalogError::PersistenceError` if:
/// - The snapshot cannot be serialized to JSON
/// - The file cannot be created
/// - The data cannot be written to the file
pub fn save_snapshot(
    path: impl AsRef<Path>,
    snapshot: &CatalogSnapshot,
) -> Result<(), CatalogError> {
    let serialized = serde_json::to_string_pretty(snapshot)
        .map_err(|e| CatalogError::PersistenceError(e.to_string()))?;

    let mut file = File::create(path.as_ref())
        .map_err(|e| CatalogError::PersistenceError(format!("Failed to create file: {e}")))?;

    file.write_all(serialized.as_bytes())
        .map_err(|e| CatalogError::PersistenceError(format!("Failed to write to file: {e}")))?;

    Ok(())
}

/// Read a snapshot written by [`save_snapshot`].
///
/// Books marked available lose any stored borrower, as with line decoding.
///
/// # Errors
///
/// Returns a `CatalogError::LoadError` if the file cannot be read or the JSON parsing
/// fails
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<CatalogSnapshot, CatalogError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .map_err(|e| CatalogError::LoadError(format!("Failed to read file: {e}")))?;

    let mut snapshot: CatalogSnapshot = serde_json::from_str(&contents)
        .map_err(|e| CatalogError::LoadError(format!("Failed to parse JSON: {e}")))?;

    for book in &mut snapshot.books {
        book.enforce_availability();
    }
    Ok(snapshot)
}
