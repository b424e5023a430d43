use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use lending_catalog::{
    AuditConfig, AuditSink, Book, Catalog, CatalogError, FileAuditLog, SortKey, User,
};

/// Command-line front end for the lending library catalog
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Catalog file, one book per line
    #[arg(short, long, default_value = "books.txt")]
    data: PathBuf,

    /// Audit log file (overrides the config file)
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// JSON file with audit log settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not echo audit entries to the console
    #[arg(short, long)]
    quiet: bool,

    /// Do not flush the audit log after every entry
    #[arg(long)]
    no_flush: bool,

    /// What to do
    #[command(subcommand)]
    command: Command,
}

/// Catalog operations
#[derive(Subcommand, Debug)]
enum Command {
    /// List every book
    List {
        /// Order the listing by this field
        #[arg(long, value_enum)]
        sort: Option<SortField>,
        /// Sort in descending order
        #[arg(long)]
        desc: bool,
    },
    /// List books that can be checked out
    Available,
    /// Find books whose title contains a string, ignoring case
    SearchTitle {
        /// Text to look for
        query: String,
    },
    /// Find books whose author contains a string, ignoring case
    SearchAuthor {
        /// Text to look for
        query: String,
    },
    /// Add a book and save the catalog
    Add {
        /// Book title
        title: String,
        /// Book author
        author: String,
        /// Book ISBN
        isbn: String,
    },
    /// Remove a book by ISBN and save the catalog
    Remove {
        /// ISBN of the book to remove
        isbn: String,
    },
    /// Show book totals
    Stats,
    /// Run a checkout and return on a seeded in-memory catalog
    Demo,
}

/// Sort field accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortField {
    /// Sort by title
    Title,
    /// Sort by author
    Author,
}

impl From<SortField> for SortKey {
    fn from(field: SortField) -> Self {
        match field {
            SortField::Title => Self::Title,
            SortField::Author => Self::Author,
        }
    }
}

/// Combine the optional config file with command-line overrides
fn audit_config(args: &Args) -> Result<AuditConfig, CatalogError> {
    let mut config = match &args.config {
        Some(path) => AuditConfig::from_json_file(path)?,
        None => AuditConfig::default(),
    };
    if let Some(log) = &args.log {
        config.path.clone_from(log);
    }
    if args.quiet {
        config.console_output = false;
    }
    if args.no_flush {
        config.auto_flush = false;
    }
    Ok(config)
}

/// Print a list of books, or a note when there are none
fn print_books(books: &[&Book]) {
    if books.is_empty() {
        println!("{}", "No matching books.".yellow());
        return;
    }
    for book in books {
        println!("\n{book}");
    }
}

/// Print the outcome of a mutating call
fn report(success: bool, what: &str) {
    if success {
        println!("{} {what}", "OK".green().bold());
    } else {
        println!("{} {what}", "FAILED".red().bold());
    }
}

/// Seed a catalog and walk one book through checkout and return
fn run_demo(audit: Arc<dyn AuditSink>) {
    println!("{}", "Lending catalog demonstration".green().bold());
    println!("=====================================\n");

    let mut catalog = Catalog::new(Some(audit));
    catalog.add_book(Book::new("War and Peace", "Leo Tolstoy", "111"));
    catalog.add_book(Book::new("Emma", "Jane Austen", "222"));
    catalog.add_book(Book::new("Anna Karenina", "Leo Tolstoy", "333"));
    catalog.add_user(User::new("u1", "Alice"));
    catalog.add_user(User::new("u2", "Bob"));

    report(catalog.check_out_book("111", "u1"), "Alice borrows War and Peace");
    report(catalog.check_out_book("111", "u2"), "Bob borrows War and Peace");
    report(catalog.check_out_book("missing-isbn", "u1"), "Alice borrows an unknown book");

    catalog.display_available_books();
    catalog.display_all_users();

    report(catalog.return_book("111"), "War and Peace comes back");
    report(catalog.return_book("111"), "War and Peace comes back again");

    let mut by_author = catalog.search_by_author("tolstoy");
    catalog.sort_by_title(&mut by_author, true);
    println!("\n{}", "Tolstoy, by title:".blue());
    print_books(&catalog.books_for(&by_author));

    let counts = catalog.counts();
    println!(
        "\nTotal: {}  Available: {}  Checked out: {}",
        counts.total, counts.available, counts.checked_out
    );
}

/// Execute the chosen subcommand against the catalog file
fn run(args: &Args, audit: Arc<dyn AuditSink>) -> Result<(), CatalogError> {
    let mut catalog = Catalog::new(Some(Arc::clone(&audit)));
    if !matches!(args.command, Command::Demo) && args.data.exists() {
        catalog.load_books_from(&args.data)?;
    }

    match &args.command {
        Command::List { sort, desc } => {
            if let Some(field) = sort {
                catalog.sort_books((*field).into(), !desc);
            }
            catalog.display_all_books();
        }
        Command::Available => catalog.display_available_books(),
        Command::SearchTitle { query } => {
            print_books(&catalog.books_for(&catalog.search_by_title(query)));
        }
        Command::SearchAuthor { query } => {
            print_books(&catalog.books_for(&catalog.search_by_author(query)));
        }
        Command::Add { title, author, isbn } => {
            catalog.add_book(Book::new(title, author, isbn));
            catalog.save_books_to(&args.data)?;
            report(true, &format!("added {isbn}"));
        }
        Command::Remove { isbn } => {
            let removed = catalog.remove_book(isbn);
            if removed {
                catalog.save_books_to(&args.data)?;
            }
            report(removed, &format!("removed {isbn}"));
        }
        Command::Stats => {
            let counts = catalog.counts();
            println!("{} {}", "Total:".bold(), counts.total);
            println!("{} {}", "Available:".bold(), counts.available);
            println!("{} {}", "Checked out:".bold(), counts.checked_out);
        }
        Command::Demo => run_demo(audit),
    }
    Ok(())
}

fn main() -> std::process::ExitCode {
    let args = Args::parse();

    let config = match audit_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            return std::process::ExitCode::FAILURE;
        }
    };
    let log = Arc::new(FileAuditLog::from_config(&config));
    let sink: Arc<dyn AuditSink> = log.clone();

    let result = run(&args, sink);
    log.save();

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            log.log_error(&e.to_string());
            eprintln!("{} {e}", "error:".red().bold());
            std::process::ExitCode::FAILURE
        }
    }
}
