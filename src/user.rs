use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

/// A registered library patron and the ISBNs they currently hold
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    /// Unique identifier
    user_id: String,
    /// Display name, copied onto books this user borrows
    name: String,
    /// ISBNs currently lent to this user
    borrowed_isbns: BTreeSet<String>,
}

impl User {
    /// Create a user with nothing borrowed
    #[must_use]
    pub fn new(user_id: &str, name: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: name.to_string(),
            borrowed_isbns: BTreeSet::new(),
        }
    }

    /// Unique identifier
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// ISBNs currently held, in sorted order
    #[must_use]
    pub fn borrowed_isbns(&self) -> &BTreeSet<String> {
        &self.borrowed_isbns
    }

    /// Record that this user holds `isbn`
    pub fn borrow_book(&mut self, isbn: &str) {
        self.borrowed_isbns.insert(isbn.to_string());
    }

    /// Forget `isbn`; no-op if it was not held
    pub fn return_book(&mut self, isbn: &str) {
        self.borrowed_isbns.remove(isbn);
    }

    /// Whether this user currently holds `isbn`
    #[must_use]
    pub fn has_borrowed_book(&self, isbn: &str) -> bool {
        self.borrowed_isbns.contains(isbn)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User ID: {}\nName: {}\nBorrowed books: ", self.user_id, self.name)?;
        if self.borrowed_isbns.is_empty() {
            write!(f, "none")
        } else {
            let isbns: Vec<&str> = self.borrowed_isbns.iter().map(String::as_str).collect();
            write!(f, "{}", isbns.join(", "))
        }
    }
}
