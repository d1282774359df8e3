//! Fabula CLI: book narrative-analysis client.
//!
//! Usage:
//!   fabula books list
//!   fabula toc show <book-id> [--previews]
//!   fabula toc mark <book-id> <part-id> <true|false>
//!   fabula extract trigger|status|watch <book-id>
//!   fabula entities list <book-id> [--category <c>] [--search <term>]

use clap::{Parser, Subcommand};
use fabula::{
    BookId, EntityCategory, EntityFilter, ExtractionProcess, FabulaApi, FabulaError,
    HttpBookService, PartId, ProcessState, ProgressReport,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fabula", version, about = "Book narrative-analysis client")]
struct Cli {
    /// Service base URL (overrides env and config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer credential (overrides env and config file)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Config file path (default: ~/.config/fabula/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage books
    Books {
        #[command(subcommand)]
        action: BooksAction,
    },
    /// Inspect and classify the table of contents
    Toc {
        #[command(subcommand)]
        action: TocAction,
    },
    /// Drive the entity-extraction job
    Extract {
        #[command(subcommand)]
        action: ExtractAction,
    },
    /// Browse extracted entities
    Entities {
        #[command(subcommand)]
        action: EntitiesAction,
    },
}

#[derive(Subcommand)]
enum BooksAction {
    /// List uploaded books
    List,
    /// Delete a book
    Delete {
        /// Book id
        book: BookId,
    },
}

#[derive(Subcommand)]
enum TocAction {
    /// Print the part tree
    Show {
        /// Book id
        book: BookId,
        /// Also fetch and show content previews
        #[arg(long)]
        previews: bool,
    },
    /// Print one part's full content
    Part {
        /// Part id
        part: PartId,
    },
    /// Set a part's narrative flag
    Mark {
        /// Book id
        book: BookId,
        /// Part id
        part: PartId,
        /// New flag value (true or false)
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
}

#[derive(Subcommand)]
enum ExtractAction {
    /// Start the extraction job
    Trigger {
        /// Book id
        book: BookId,
    },
    /// Print current job status
    Status {
        /// Book id
        book: BookId,
    },
    /// Poll until the job completes, printing progress
    Watch {
        /// Book id
        book: BookId,
    },
}

#[derive(Subcommand)]
enum EntitiesAction {
    /// List extracted entities, ranked by occurrences
    List {
        /// Book id
        book: BookId,
        /// Keep only one category
        #[arg(long)]
        category: Option<EntityCategory>,
        /// Keep only names containing this term
        #[arg(long)]
        search: Option<String>,
    },
}

fn print_error(err: &FabulaError) {
    eprintln!("Error: {}", err);
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}

async fn cmd_books_list(api: &FabulaApi) -> i32 {
    match api.books().await {
        Ok(books) if books.is_empty() => {
            println!("No books uploaded.");
            0
        }
        Ok(books) => {
            println!("{:<36}  {:<32}  {:<24}  {:>6}", "ID", "TITLE", "AUTHOR", "PARSED");
            println!("{}", "-".repeat(104));
            for book in books {
                println!(
                    "{:<36}  {:<32}  {:<24}  {:>6}",
                    book.id,
                    book.title,
                    book.author,
                    if book.is_parsed { "yes" } else { "no" }
                );
            }
            0
        }
        Err(err) => {
            print_error(&err);
            1
        }
    }
}

async fn cmd_books_delete(api: &FabulaApi, book: BookId) -> i32 {
    match api.delete_book(book).await {
        Ok(deleted) => {
            println!("Deleted '{}' ({})", deleted.title, deleted.id);
            0
        }
        Err(err) => {
            print_error(&err);
            1
        }
    }
}

async fn cmd_toc_show(api: &FabulaApi, book: BookId, previews: bool) -> i32 {
    let arena = match api.refresh_toc(book).await {
        Ok(arena) => arena,
        Err(err) => {
            print_error(&err);
            return 1;
        }
    };

    let tree = arena.read().await;
    for part in tree.preorder() {
        let depth = tree.depth(&part.id).unwrap_or(0) as usize;
        let marker = if part.is_story_part { "narrative" } else { "-" };
        let mut line = format!(
            "{}{:<36}  [{}]  {}",
            "  ".repeat(depth),
            part.id,
            marker,
            part.label
        );
        if previews {
            if let Ok(Some(preview)) = api.part_preview(book, part.id).await {
                line.push_str(&format!("  | {}", preview));
            }
        }
        println!("{}", line);
    }
    0
}

async fn cmd_toc_part(api: &FabulaApi, part: PartId) -> i32 {
    match api.part(part).await {
        Ok(part) => {
            println!(
                "{}  [{}]",
                part.label,
                if part.is_story_part { "narrative" } else { "-" }
            );
            println!("{}", part.content);
            0
        }
        Err(err) => {
            print_error(&err);
            1
        }
    }
}

async fn cmd_toc_mark(api: &FabulaApi, book: BookId, part: PartId, value: bool) -> i32 {
    api.select_book(Some(book));
    match api.set_story_part(part, value).await {
        Ok(outcome) => {
            println!(
                "Part {} marked {} (was {})",
                outcome.part_id,
                if outcome.persisted { "narrative" } else { "non-narrative" },
                if outcome.previous { "narrative" } else { "non-narrative" }
            );
            0
        }
        Err(err) => {
            print_error(&err);
            1
        }
    }
}

fn print_status(process: &ExtractionProcess, report: &ProgressReport) {
    match process.state() {
        ProcessState::Unrequested => {
            println!(
                "Extraction not requested (estimated cost: {})",
                process.estimated_cost.round()
            );
        }
        state => {
            let mut line = format!("[{}] Completion: {}", state, report.percentage_label());
            if let Some(remaining) = report.remaining_label() {
                line.push_str(&format!("  ~{} remaining", remaining));
            }
            println!("{}", line);
        }
    }
}

async fn cmd_extract_trigger(api: &FabulaApi, book: BookId) -> i32 {
    match api.trigger_extraction(book).await {
        Ok(process) => {
            println!("Extraction started for book {}", process.book_id);
            0
        }
        Err(err) => {
            print_error(&err);
            1
        }
    }
}

async fn cmd_extract_status(api: &FabulaApi, book: BookId) -> i32 {
    match api.extraction_status(book).await {
        Ok(process) => {
            let report = fabula::estimate(
                &process,
                chrono::Utc::now(),
                &fabula::EstimatorConfig::default(),
            );
            print_status(&process, &report);
            0
        }
        Err(err) => {
            print_error(&err);
            1
        }
    }
}

async fn cmd_extract_watch(api: &FabulaApi, book: BookId) -> i32 {
    api.select_book(Some(book));
    match api.watch_extraction(book, |process, report| print_status(process, report)).await {
        Ok(_) => {
            println!("Extraction complete.");
            0
        }
        Err(err) => {
            print_error(&err);
            1
        }
    }
}

async fn cmd_entities_list(
    api: &FabulaApi,
    book: BookId,
    category: Option<EntityCategory>,
    search: Option<String>,
) -> i32 {
    let rollups = match api.entity_rollup(book).await {
        Ok(rollups) => rollups,
        Err(err) => {
            print_error(&err);
            return 1;
        }
    };

    let filter = EntityFilter { category, search };
    let visible = filter.apply(&rollups);
    if visible.is_empty() {
        println!("No entities.");
        return 0;
    }

    println!("{:<28}  {:<14}  {:>11}  PARTS", "NAME", "CATEGORY", "OCCURRENCES");
    println!("{}", "-".repeat(72));
    for rollup in visible {
        let parts: Vec<String> = rollup
            .parts
            .iter()
            .map(|p| {
                p.label
                    .clone()
                    .unwrap_or_else(|| p.part_id.to_string())
            })
            .collect();
        println!(
            "{:<28}  {:<14}  {:>11}  {}",
            rollup.name,
            rollup.category,
            rollup.total_occurrences,
            parts.join(", ")
        );
    }
    0
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match fabula::config::Config::resolve(cli.api_url, cli.token, cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    };

    let service = HttpBookService::new(config.api_url, config.token);
    let api = FabulaApi::new(Arc::new(service));

    let code = match cli.command {
        Commands::Books { action } => match action {
            BooksAction::List => cmd_books_list(&api).await,
            BooksAction::Delete { book } => cmd_books_delete(&api, book).await,
        },
        Commands::Toc { action } => match action {
            TocAction::Show { book, previews } => cmd_toc_show(&api, book, previews).await,
            TocAction::Part { part } => cmd_toc_part(&api, part).await,
            TocAction::Mark { book, part, value } => cmd_toc_mark(&api, book, part, value).await,
        },
        Commands::Extract { action } => match action {
            ExtractAction::Trigger { book } => cmd_extract_trigger(&api, book).await,
            ExtractAction::Status { book } => cmd_extract_status(&api, book).await,
            ExtractAction::Watch { book } => cmd_extract_watch(&api, book).await,
        },
        Commands::Entities { action } => match action {
            EntitiesAction::List {
                book,
                category,
                search,
            } => cmd_entities_list(&api, book, category, search).await,
        },
    };
    std::process::exit(code);
}
