mod config;
mod logging;
mod prompt;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use config::AppConfig;
use novellog_adapters::{
    encode_image_file, present_book_detail, present_book_row, present_import_summary,
    present_preferences, read_import_file, write_backup, JsonPreferenceStore,
    SqliteBookRepository, SystemClock, UuidIdSource,
};
use novellog_application::{
    AddEntryCommand, ApplicationError, ApplicationService, BatchDeleteCommand, BootstrapCommand,
    ClearLibraryCommand, CreateBookCommand, DeleteEntryCommand, ExportCommand,
    FinishImportCommand, ImportCommand, ImportOutcome, SetLanguageCommand, SetThemeCommand,
    Theme, UpdateBookCommand, ViewQuery,
};
use novellog_domain::{BookDraft, BookId, BookPatch, EntryDraft, EntryId, Rating, SortField};
use prompt::{resolve_conflicts, ConflictPolicy};

#[derive(Debug, Parser)]
#[command(name = "novellog", version, about = "Reading journal: books, ratings and notes")]
struct Cli {
    /// SQLite catalog file.
    #[arg(long, global = true, env = "NOVELLOG_CATALOG")]
    catalog: Option<PathBuf>,
    /// JSON file holding theme and language.
    #[arg(long, global = true, env = "NOVELLOG_PREFERENCES")]
    preferences: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List books, newest first unless another sort is given.
    List {
        #[arg(short, long, default_value = "")]
        query: String,
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        #[arg(short, long, default_value = "updated")]
        sort: SortField,
    },
    Show {
        id: String,
    },
    Add {
        #[arg(long)]
        title: String,
        #[arg(long = "protagonist")]
        protagonists: Vec<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long, default_value_t = 0)]
        rating: i64,
        /// First note, stored as an entry of the new book.
        #[arg(long)]
        note: Option<String>,
    },
    /// Edit fields of a book; repeated list flags replace the stored list.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        rating: Option<i64>,
        #[arg(long = "protagonist")]
        protagonists: Vec<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Add a note to a book.
    Note {
        book_id: String,
        text: Option<String>,
        #[arg(long = "image")]
        images: Vec<PathBuf>,
    },
    RemoveNote {
        book_id: String,
        entry_id: String,
    },
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Export {
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    Import {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = ConflictPolicy::Ask)]
        on_conflict: ConflictPolicy,
    },
    Tags,
    Prefs {
        #[arg(long)]
        theme: Option<Theme>,
        #[arg(long)]
        language: Option<String>,
    },
    /// Delete every book.
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Clone)]
enum CommandError {
    Usage(String),
    Runtime(String),
}

impl From<ApplicationError> for CommandError {
    fn from(error: ApplicationError) -> Self {
        if error.is_user_error() {
            Self::Usage(error.to_string())
        } else {
            Self::Runtime(error.to_string())
        }
    }
}

fn main() -> ExitCode {
    logging::init_logging();
    let cli = Cli::parse();
    let config = AppConfig::with_overrides(cli.catalog.clone(), cli.preferences.clone());

    tracing::debug!(
        catalog = %config.catalog_path.display(),
        preferences = %config.preferences_path.display(),
        "opening library"
    );

    let mut service = build_application_service(&config);
    if let Err(error) = service.bootstrap(BootstrapCommand) {
        eprintln!("failed to open {}: {error}", config.catalog_path.display());
        return ExitCode::from(1);
    }

    match run_command(cli.command, &mut service) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CommandError::Usage(msg)) => {
            eprintln!("{msg}");
            ExitCode::from(2)
        }
        Err(CommandError::Runtime(msg)) => {
            eprintln!("{msg}");
            ExitCode::from(1)
        }
    }
}

fn build_application_service(config: &AppConfig) -> ApplicationService {
    ApplicationService::new(
        Box::new(SqliteBookRepository::new(config.catalog_path.clone())),
        Box::new(SystemClock),
        Box::new(UuidIdSource),
        Box::new(JsonPreferenceStore::new(config.preferences_path.clone())),
    )
}

fn book_id(raw: &str) -> Result<BookId, CommandError> {
    BookId::new(raw).map_err(|error| CommandError::Usage(format!("invalid book id: {error}")))
}

fn rating(raw: i64) -> Result<Rating, CommandError> {
    Rating::new(raw).map_err(|error| CommandError::Usage(error.to_string()))
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    (!values.is_empty()).then_some(values)
}

fn run_command(command: Command, service: &mut ApplicationService) -> Result<(), CommandError> {
    match command {
        Command::List { query, tags, sort } => {
            let books = service.view(&ViewQuery {
                text: query,
                tags: tags.into_iter().collect(),
                sort,
            });
            if books.is_empty() {
                println!("no books match");
                return Ok(());
            }
            for book in books {
                println!("{}", present_book_row(book));
            }
            Ok(())
        }
        Command::Show { id } => {
            let id = book_id(&id)?;
            let book = service
                .open_book(&id)
                .ok_or_else(|| CommandError::Runtime(format!("no book with id {id}")))?;
            println!("{}", present_book_detail(book));
            Ok(())
        }
        Command::Add {
            title,
            protagonists,
            tags,
            rating: raw_rating,
            note,
        } => {
            let saved = service.create(CreateBookCommand {
                draft: BookDraft {
                    title,
                    protagonists,
                    rating: rating(raw_rating)?,
                    tags,
                },
                unsaved_entry: note.map(EntryDraft::text),
            })?;
            if saved.duplicate_title {
                eprintln!("warning: another book is already titled \"{}\"", saved.book.title);
            }
            println!("{}", present_book_row(&saved.book));
            Ok(())
        }
        Command::Edit {
            id,
            title,
            rating: raw_rating,
            protagonists,
            tags,
            note,
        } => {
            let id = book_id(&id)?;
            let saved = service
                .update(UpdateBookCommand {
                    id: id.clone(),
                    patch: BookPatch {
                        title,
                        protagonists: non_empty(protagonists),
                        rating: raw_rating.map(rating).transpose()?,
                        tags: non_empty(tags),
                    },
                    unsaved_entry: note.map(EntryDraft::text),
                })?
                .ok_or_else(|| CommandError::Runtime(format!("no book with id {id}")))?;
            if saved.duplicate_title {
                eprintln!("warning: another book is already titled \"{}\"", saved.book.title);
            }
            println!("{}", present_book_row(&saved.book));
            Ok(())
        }
        Command::Note {
            book_id: raw_id,
            text,
            images,
        } => {
            let id = book_id(&raw_id)?;
            let images = images
                .iter()
                .map(|path| encode_image_file(path))
                .collect::<Result<Vec<_>, _>>()?;
            let book = service
                .add_entry(AddEntryCommand {
                    book_id: id.clone(),
                    entry: EntryDraft {
                        content: text.unwrap_or_default(),
                        images,
                    },
                })?
                .ok_or_else(|| CommandError::Runtime(format!("no book with id {id}")))?;
            if let Some(entry) = book.entries.first() {
                println!("added note {} to \"{}\"", entry.id, book.title);
            }
            Ok(())
        }
        Command::RemoveNote { book_id: raw_id, entry_id } => {
            let id = book_id(&raw_id)?;
            let entry_id = EntryId::new(entry_id)
                .map_err(|error| CommandError::Usage(format!("invalid entry id: {error}")))?;
            service
                .delete_entry(DeleteEntryCommand {
                    book_id: id.clone(),
                    entry_id: entry_id.clone(),
                })?
                .ok_or_else(|| CommandError::Runtime(format!("no book with id {id}")))?;
            println!("removed note {entry_id}");
            Ok(())
        }
        Command::Delete { ids } => {
            let ids = ids
                .iter()
                .map(|raw| book_id(raw))
                .collect::<Result<Vec<_>, _>>()?;
            let outcome = service.batch_delete(BatchDeleteCommand { ids })?;
            println!("deleted {} book(s)", outcome.removed);
            Ok(())
        }
        Command::Export { out } => {
            let bundle = service.export(ExportCommand)?;
            let path = write_backup(&out, &bundle)?;
            println!("exported {} book(s) to {}", bundle.books, path.display());
            Ok(())
        }
        Command::Import { file, on_conflict } => {
            let json = read_import_file(&file)?;
            let pending = match service.begin_import(ImportCommand { json })? {
                ImportOutcome::Completed(summary) => {
                    println!("{}", present_import_summary(&summary));
                    return Ok(());
                }
                ImportOutcome::NeedsResolution(pending) => pending,
            };
            println!(
                "{} book(s) imported, {} title conflict(s) to resolve",
                pending.ready_count(),
                pending.conflicts().len()
            );

            let stdin = io::stdin();
            let decisions = resolve_conflicts(
                &pending,
                on_conflict,
                &mut stdin.lock(),
                &mut io::stdout(),
            )
            .map_err(|error| CommandError::Runtime(format!("reading answers failed: {error}")))?;
            let summary = service.finish_import(FinishImportCommand { pending, decisions })?;
            println!("{}", present_import_summary(&summary));
            Ok(())
        }
        Command::Tags => {
            for tag in service.tags() {
                println!("{tag}");
            }
            Ok(())
        }
        Command::Prefs { theme, language } => {
            if let Some(theme) = theme {
                service.set_theme(SetThemeCommand { theme })?;
            }
            if let Some(language) = language {
                service.set_language(SetLanguageCommand { language })?;
            }
            println!("{}", present_preferences(service.preferences()));
            Ok(())
        }
        Command::Clear { yes } => {
            if !yes {
                return Err(CommandError::Usage(
                    "clear deletes every book; pass --yes to confirm".to_string(),
                ));
            }
            let outcome = service.clear_library(ClearLibraryCommand)?;
            println!("deleted {} book(s)", outcome.removed);
            Ok(())
        }
    }
}
