//! Catalog manager for a lending library.
//!
//! This crate tracks books and users, lends each book to at most one user at a time,
//! and keeps every user's borrowed-book set in step with book state. Books persist as
//! pipe-delimited text lines.

pub mod audit;
pub mod book;
pub mod catalog;
pub mod config;
pub mod error;
pub mod persistence;
pub mod user;

pub use audit::{AuditLevel, AuditSink, FileAuditLog, MemoryAuditLog};
pub use book::Book;
pub use catalog::{BookHandle, Catalog, CatalogCounts, SortKey};
pub use config::AuditConfig;
pub use error::CatalogError;
pub use persistence::CatalogSnapshot;
pub use user::User;
