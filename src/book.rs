use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between fields of a persisted book line
pub const FIELD_DELIMITER: char = '|';

/// Number of fields in a persisted book line
const FIELD_COUNT: usize = 5;

/// A single book held by the library.
///
/// A book is available exactly when it has no borrower. [`Book::check_out`] and
/// [`Book::return_book`] always move both fields together; direct setters exist for
/// callers that edit records by hand and are not checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Book {
    /// Book title
    title: String,
    /// Book author
    author: String,
    /// ISBN, used as the lookup key
    isbn: String,
    /// Whether the book is on the shelf
    available: bool,
    /// Display name of the current borrower, empty when available
    borrower: String,
}

impl Book {
    /// Create an available book with no borrower
    #[must_use]
    pub fn new(title: &str, author: &str, isbn: &str) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            isbn: isbn.to_string(),
            available: true,
            borrower: String::new(),
        }
    }

    /// Book title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Book author
    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Book ISBN
    #[must_use]
    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    /// Whether the book can be checked out
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Display name of the borrower, empty when the book is available
    #[must_use]
    pub fn borrower(&self) -> &str {
        &self.borrower
    }

    /// Replace the title
    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    /// Replace the author
    pub fn set_author(&mut self, author: &str) {
        self.author = author.to_string();
    }

    /// Replace the ISBN
    pub fn set_isbn(&mut self, isbn: &str) {
        self.isbn = isbn.to_string();
    }

    /// Overwrite the availability flag without touching the borrower
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Overwrite the borrower without touching the availability flag
    pub fn set_borrower(&mut self, borrower: &str) {
        self.borrower = borrower.to_string();
    }

    /// Mark the book as lent to `borrower`.
    ///
    /// Availability is not checked here; the catalog verifies it before calling.
    pub fn check_out(&mut self, borrower: &str) {
        self.available = false;
        self.borrower = borrower.to_string();
    }

    /// Put the book back on the shelf. Calling this on an available book is a no-op.
    pub fn return_book(&mut self) {
        self.available = true;
        self.borrower.clear();
    }

    /// Encode as `title|author|isbn|flag|borrower`, where `flag` is `1` when available.
    ///
    /// Fields are written verbatim. A field containing `|` will not decode back to the
    /// same record.
    #[must_use]
    pub fn to_line(&self) -> String {
        let flag = if self.available { "1" } else { "0" };
        let mut buf = [0; 4];
        let delimiter: &str = FIELD_DELIMITER.encode_utf8(&mut buf);
        let fields = [
            self.title.as_str(),
            self.author.as_str(),
            self.isbn.as_str(),
            flag,
            self.borrower.as_str(),
        ];
        fields.join(delimiter)
    }

    /// Decode a line produced by [`Book::to_line`].
    ///
    /// Never fails: missing trailing fields decode as empty strings, any flag other than
    /// `1` means checked out, and anything after the fifth field is ignored. The borrower
    /// is dropped when the flag says available.
    #[must_use]
    pub fn from_line(line: &str) -> Self {
        let mut fields = line.split(FIELD_DELIMITER).take(FIELD_COUNT).map(str::to_string);
        let mut next = || fields.next().unwrap_or_default();

        let title = next();
        let author = next();
        let isbn = next();
        let available = next() == "1";
        let borrower = next();

        let mut book = Self { title, author, isbn, available, borrower };
        book.enforce_availability();
        book
    }

    /// Clear the borrower of an available book
    pub(crate) fn enforce_availability(&mut self) {
        if self.available {
            self.borrower.clear();
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Title: {}\nAuthor: {}\nISBN: {}\nAvailable: {}",
            self.title,
            self.author,
            self.isbn,
            if self.available { "Yes" } else { "No" }
        )?;
        if !self.available && !self.borrower.is_empty() {
            write!(f, "\nBorrowed by: {}", self.borrower)?;
        }
        Ok(())
    }
}
