//! The catalog manager.
//!
//! [`Catalog`] owns every book and user and is the only place that moves a book between
//! available and checked out. A checkout or return changes the book and the borrower's
//! record together.
//!
//! Books are addressed through [`BookHandle`]s rather than references. A handle stays
//! valid across sorts and other insertions, and resolves to `None` once its book has
//! been removed.
//!
//! Not enforced, on purpose: ISBNs need not be unique (lookups take the first match), a
//! checked-out book can be removed (its ISBN stays in the borrower's set), and if
//! several users claim the same ISBN a return clears only the first of them.

use std::{cmp::Ordering, collections::HashMap, fmt, path::Path, sync::Arc};

use crate::{
    audit::AuditSink,
    book::Book,
    error::CatalogError,
    persistence::{self, CatalogSnapshot},
    user::User,
};

/// Stable identifier of a book inside one [`Catalog`]. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BookHandle(u64);

/// A book together with the handle it was given on insertion
#[derive(Debug, Clone)]
struct BookEntry {
    /// Handle assigned by [`Catalog::add_book`]
    handle: BookHandle,
    /// The owned record
    book: Book,
}

/// Field used to order books
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// Order by title, ignoring case
    Title,
    /// Order by author, ignoring case
    Author,
}

impl SortKey {
    /// Lowercased value of this field for `book`
    fn folded(self, book: &Book) -> String {
        match self {
            Self::Title => book.title().to_lowercase(),
            Self::Author => book.author().to_lowercase(),
        }
    }
}

/// Flip `ordering` for descending sorts. Ties stay ties, so a stable sort keeps their
/// original order either way.
fn directed(ordering: Ordering, ascending: bool) -> Ordering {
    if ascending { ordering } else { ordering.reverse() }
}

/// Book totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogCounts {
    /// Every book in the catalog
    pub total: usize,
    /// Books on the shelf
    pub available: usize,
    /// Books lent out, always `total - available`
    pub checked_out: usize,
}

/// Render a numbered list of blocks under `heading`, or `empty` if there is nothing
fn render_blocks<T: fmt::Display>(heading: &str, label: &str, empty: &str, items: &[&T]) -> String {
    if items.is_empty() {
        return format!("{empty}\n");
    }

    let separator = "-".repeat(heading.len());
    let mut out = format!("\n{heading}\n");
    for (number, item) in (1_usize..).zip(items) {
        out.push_str(&format!("\n{label} {number}:\n{item}\n{separator}\n"));
    }
    out
}

/// Owner of all books and users in the library
pub struct Catalog {
    /// Books in catalog order
    books: Vec<BookEntry>,
    /// Position of each live handle in `books`
    positions: HashMap<BookHandle, usize>,
    /// Users in registration order
    users: Vec<User>,
    /// Value of the next handle to hand out
    next_handle: u64,
    /// Where mutation reports go, if anywhere
    audit: Option<Arc<dyn AuditSink>>,
}

// Manual implementation of Debug for Catalog
impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("books", &self.books)
            .field("users", &self.users)
            .field("positions", &self.positions.len())
            .field("next_handle", &self.next_handle)
            .field("has_audit", &self.audit.is_some())
            .finish()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Catalog {
    /// Create an empty catalog reporting to `audit`. `None` disables reporting.
    #[must_use]
    pub fn new(audit: Option<Arc<dyn AuditSink>>) -> Self {
        Self {
            books: Vec::new(),
            positions: HashMap::new(),
            users: Vec::new(),
            next_handle: 0,
            audit,
        }
    }

    /// Rebuild the handle index after books moved
    fn reindex(&mut self) {
        self.positions =
            self.books.iter().enumerate().map(|(pos, entry)| (entry.handle, pos)).collect();
    }

    /// Send an info line to the audit sink, if any
    fn audit_info(&self, message: &str) {
        if let Some(audit) = &self.audit {
            audit.log_info(message);
        }
    }

    /// Send a warning line to the audit sink, if any
    fn audit_warning(&self, message: &str) {
        if let Some(audit) = &self.audit {
            audit.log_warning(message);
        }
    }

    /// The audit sink this catalog reports to
    #[must_use]
    pub fn audit(&self) -> Option<&Arc<dyn AuditSink>> {
        self.audit.as_ref()
    }

    /// Append `book` to the catalog. Duplicate ISBNs are accepted.
    pub fn add_book(&mut self, book: Book) -> BookHandle {
        let handle = BookHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);

        let message = format!("Book added: {} (ISBN: {})", book.title(), book.isbn());
        self.positions.insert(handle, self.books.len());
        self.books.push(BookEntry { handle, book });
        self.audit_info(&message);
        handle
    }

    /// Remove the first book with `isbn`. Returns whether one was found.
    ///
    /// The book is removed even if it is checked out; its borrower keeps the ISBN.
    pub fn remove_book(&mut self, isbn: &str) -> bool {
        let Some(pos) = self.books.iter().position(|entry| entry.book.isbn() == isbn) else {
            return false;
        };

        self.books.remove(pos);
        self.reindex();
        self.audit_info(&format!("Book removed: {isbn}"));
        true
    }

    /// Handle of the first book with `isbn`
    #[must_use]
    pub fn find_book_by_isbn(&self, isbn: &str) -> Option<BookHandle> {
        self.books.iter().find(|entry| entry.book.isbn() == isbn).map(|entry| entry.handle)
    }

    /// The book behind `handle`, or `None` if it has been removed
    #[must_use]
    pub fn book(&self, handle: BookHandle) -> Option<&Book> {
        let pos = *self.positions.get(&handle)?;
        self.books.get(pos).map(|entry| &entry.book)
    }

    /// The first book with `isbn`
    #[must_use]
    pub fn book_by_isbn(&self, isbn: &str) -> Option<&Book> {
        self.books.iter().map(|entry| &entry.book).find(|book| book.isbn() == isbn)
    }

    /// Resolve handles to books, in the given order, skipping removed ones
    #[must_use]
    pub fn books_for(&self, handles: &[BookHandle]) -> Vec<&Book> {
        handles.iter().filter_map(|&handle| self.book(handle)).collect()
    }

    /// Handles of books matching `predicate`, in catalog order
    fn handles_where(&self, predicate: impl Fn(&Book) -> bool) -> Vec<BookHandle> {
        self.books.iter().filter(|entry| predicate(&entry.book)).map(|entry| entry.handle).collect()
    }

    /// Books whose title contains `query`, ignoring case
    #[must_use]
    pub fn search_by_title(&self, query: &str) -> Vec<BookHandle> {
        let query = query.to_lowercase();
        self.handles_where(|book| book.title().to_lowercase().contains(&query))
    }

    /// Books whose author contains `query`, ignoring case
    #[must_use]
    pub fn search_by_author(&self, query: &str) -> Vec<BookHandle> {
        let query = query.to_lowercase();
        self.handles_where(|book| book.author().to_lowercase().contains(&query))
    }

    /// Books that can be checked out, in catalog order
    #[must_use]
    pub fn available_books(&self) -> Vec<BookHandle> {
        self.handles_where(Book::is_available)
    }

    /// Every book, in catalog order
    #[must_use]
    pub fn all_books(&self) -> Vec<BookHandle> {
        self.handles_where(|_| true)
    }

    /// Stable sort of a handle list by `key`, leaving catalog order alone.
    ///
    /// Handles of removed books have no key and compare lowest.
    pub fn sort_handles(&self, handles: &mut [BookHandle], key: SortKey, ascending: bool) {
        let mut keyed: Vec<(Option<String>, BookHandle)> = handles
            .iter()
            .map(|&handle| (self.book(handle).map(|book| key.folded(book)), handle))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| directed(a.cmp(b), ascending));

        for (slot, (_, handle)) in handles.iter_mut().zip(keyed) {
            *slot = handle;
        }
    }

    /// [`Catalog::sort_handles`] by title
    pub fn sort_by_title(&self, handles: &mut [BookHandle], ascending: bool) {
        self.sort_handles(handles, SortKey::Title, ascending);
    }

    /// [`Catalog::sort_handles`] by author
    pub fn sort_by_author(&self, handles: &mut [BookHandle], ascending: bool) {
        self.sort_handles(handles, SortKey::Author, ascending);
    }

    /// Reorder the catalog itself by `key`. Stable.
    pub fn sort_books(&mut self, key: SortKey, ascending: bool) {
        self.books
            .sort_by(|a, b| directed(key.folded(&a.book).cmp(&key.folded(&b.book)), ascending));
        self.reindex();
    }

    /// Reorder the catalog itself by title
    pub fn sort_books_by_title(&mut self, ascending: bool) {
        self.sort_books(SortKey::Title, ascending);
    }

    /// Reorder the catalog itself by author
    pub fn sort_books_by_author(&mut self, ascending: bool) {
        self.sort_books(SortKey::Author, ascending);
    }

    /// Register a user. Users are never removed.
    pub fn add_user(&mut self, user: User) {
        self.users.push(user);
    }

    /// The first user with `user_id`
    #[must_use]
    pub fn find_user_by_id(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|user| user.user_id() == user_id)
    }

    /// Every user, in registration order
    #[must_use]
    pub fn all_users(&self) -> &[User] {
        &self.users
    }

    /// Lend the book `isbn` to `user_id`.
    ///
    /// Succeeds only if both exist and the book is available. The book takes the user's
    /// name as borrower and the user records the ISBN. On failure nothing changes.
    pub fn check_out_book(&mut self, isbn: &str, user_id: &str) -> bool {
        let book =
            self.books.iter_mut().map(|entry| &mut entry.book).find(|book| book.isbn() == isbn);
        let user = self.users.iter_mut().find(|user| user.user_id() == user_id);

        let lent = match (book, user) {
            (Some(book), Some(user)) if book.is_available() => {
                book.check_out(user.name());
                user.borrow_book(isbn);
                true
            }
            _ => false,
        };

        if lent {
            self.audit_info(&format!("Book checked out: ISBN={isbn} by user={user_id}"));
        } else {
            self.audit_warning(&format!("Checkout failed: ISBN={isbn} by user={user_id}"));
        }
        lent
    }

    /// Take back the book `isbn`.
    ///
    /// Fails without changes if the book is missing or already available. Otherwise the
    /// first user holding the ISBN lets go of it and the book becomes available; if no
    /// user holds it the book is returned anyway.
    pub fn return_book(&mut self, isbn: &str) -> bool {
        let book =
            self.books.iter_mut().map(|entry| &mut entry.book).find(|book| book.isbn() == isbn);

        let returned = match book {
            Some(book) if !book.is_available() => {
                let holder = self.users.iter_mut().find(|user| user.has_borrowed_book(isbn));
                if let Some(holder) = holder {
                    holder.return_book(isbn);
                }
                book.return_book();
                true
            }
            _ => false,
        };

        if returned {
            self.audit_info(&format!("Book returned: ISBN={isbn}"));
        } else {
            self.audit_warning(&format!("Return failed: ISBN={isbn}"));
        }
        returned
    }

    /// Total, available and checked-out book counts
    #[must_use]
    pub fn counts(&self) -> CatalogCounts {
        let total = self.books.len();
        let available = self.books.iter().filter(|entry| entry.book.is_available()).count();
        CatalogCounts { total, available, checked_out: total.saturating_sub(available) }
    }

    /// Every book as numbered blocks
    #[must_use]
    pub fn render_all_books(&self) -> String {
        let books: Vec<&Book> = self.books.iter().map(|entry| &entry.book).collect();
        render_blocks("=== ALL BOOKS ===", "Book", "No books in the library.", &books)
    }

    /// Available books as numbered blocks
    #[must_use]
    pub fn render_available_books(&self) -> String {
        let books = self.books_for(&self.available_books());
        render_blocks("=== AVAILABLE BOOKS ===", "Book", "No books available for checkout.", &books)
    }

    /// Every user as numbered blocks
    #[must_use]
    pub fn render_all_users(&self) -> String {
        let users: Vec<&User> = self.users.iter().collect();
        render_blocks("=== ALL USERS ===", "User", "No users registered.", &users)
    }

    /// Print [`Catalog::render_all_books`] to stdout
    pub fn display_all_books(&self) {
        print!("{}", self.render_all_books());
    }

    /// Print [`Catalog::render_available_books`] to stdout
    pub fn display_available_books(&self) {
        print!("{}", self.render_available_books());
    }

    /// Print [`Catalog::render_all_users`] to stdout
    pub fn display_all_users(&self) {
        print!("{}", self.render_all_users());
    }

    /// Append every book stored at `path`. Returns how many were added.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError::LoadError` if the file does not exist or cannot be read
    pub fn load_books_from(&mut self, path: impl AsRef<Path>) -> Result<usize, CatalogError> {
        let books = persistence::load_books(path)?;
        let added = books.len();
        for book in books {
            self.add_book(book);
        }
        Ok(added)
    }

    /// Write every book to `path` in catalog order
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError::PersistenceError` if the file cannot be created or written
    pub fn save_books_to(&self, path: impl AsRef<Path>) -> Result<(), CatalogError> {
        persistence::save_books(path, &self.snapshot().books)
    }

    /// Copy of all books and users
    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            books: self.books.iter().map(|entry| entry.book.clone()).collect(),
            users: self.users.clone(),
        }
    }

    /// Rebuild a catalog from a snapshot, reporting to `audit`
    #[must_use]
    pub fn from_snapshot(snapshot: CatalogSnapshot, audit: Option<Arc<dyn AuditSink>>) -> Self {
        let mut catalog = Self::new(audit);
        for book in snapshot.books {
            catalog.add_book(book);
        }
        catalog.users = snapshot.users;
        catalog
    }

    /// Write books and users to `path` as JSON
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError::PersistenceError` if the snapshot cannot be written
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), CatalogError> {
        persistence::save_snapshot(path, &self.snapshot())
    }

    /// Load a catalog written by [`Catalog::save_snapshot`]
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError::LoadError` if the file cannot be read or parsed
    pub fn load_snapshot(
        path: impl AsRef<Path>,
        audit: Option<Arc<dyn AuditSink>>,
    ) -> Result<Self, CatalogError> {
        Ok(Self::from_snapshot(persistence::load_snapshot(path)?, audit))
    }
}
