//! notekeep CLI: manage notes, tags, notebooks and todos from the shell.
//!
//! Usage:
//!   notekeep [--db path] [--user id] [--json] note <subcommand>
//!   notekeep [--db path] [--user id] [--json] tag <subcommand>
//!   notekeep [--db path] [--user id] [--json] notebook <subcommand>
//!   notekeep [--db path] [--user id] [--json] todo <subcommand>

use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use notekeep::{
    date_format, NewNote, NewTodo, Note, NoteId, NoteUpdate, Notebook, NotebookId, NotesApi,
    ServiceError, StorageError, Tag, TagId, Todo, TodoId, UserId,
};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "notekeep",
    version,
    about = "Personal notes with tags, notebooks and todos"
)]
struct Cli {
    /// Path to SQLite database file
    #[arg(long, global = true, env = "NOTEKEEP_DB")]
    db: Option<PathBuf>,
    /// User on whose behalf the command runs
    #[arg(long, global = true, env = "NOTEKEEP_USER")]
    user: Option<String>,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage notes
    Note {
        #[command(subcommand)]
        action: NoteAction,
    },
    /// Manage tags
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },
    /// Manage notebooks
    Notebook {
        #[command(subcommand)]
        action: NotebookAction,
    },
    /// Manage the todo items of a note
    Todo {
        #[command(subcommand)]
        action: TodoAction,
    },
}

#[derive(Subcommand)]
enum NoteAction {
    /// Create a new note
    Create {
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long)]
        favorite: bool,
        #[arg(long)]
        archived: bool,
        /// Notebook to file the note in
        #[arg(long)]
        notebook: Option<NotebookId>,
        /// Tag id to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<TagId>,
        /// Todo item title (repeatable)
        #[arg(long = "todo")]
        todos: Vec<String>,
    },
    /// List notes (active ones unless a flag says otherwise)
    List {
        #[arg(long, conflicts_with = "archived")]
        favorites: bool,
        #[arg(long)]
        archived: bool,
    },
    /// Show a note with its tags and todos
    Show { id: NoteId },
    /// Update a note; omitted fields keep their current value
    Update {
        id: NoteId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        favorite: Option<bool>,
        #[arg(long)]
        archived: Option<bool>,
        #[arg(long)]
        notebook: Option<NotebookId>,
        /// Replace the tag set with these ids (repeatable)
        #[arg(long = "tag", conflicts_with = "clear_tags")]
        tags: Vec<TagId>,
        /// Remove every tag from the note
        #[arg(long)]
        clear_tags: bool,
    },
    /// Delete a note and its todos
    Delete { id: NoteId },
}

#[derive(Subcommand)]
enum TagAction {
    /// Create a tag
    Create { name: String },
    /// List your tags
    List,
    /// List the notes carrying a tag
    Notes { id: TagId },
    /// Delete a tag
    Delete { id: TagId },
}

#[derive(Subcommand)]
enum NotebookAction {
    /// Create a notebook
    Create { name: String },
    /// List your notebooks
    List,
    /// List the notes in a notebook
    Show { id: NotebookId },
    /// Rename a notebook
    Rename { id: NotebookId, name: String },
    /// Delete a notebook (its notes are kept)
    Delete { id: NotebookId },
}

#[derive(Subcommand)]
enum TodoAction {
    /// Append a todo to a note
    Add {
        note: NoteId,
        title: String,
        /// Due date as YYYY-MM-DD
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// Mark a todo as done
    Done {
        id: TodoId,
        /// Mark it as not done instead
        #[arg(long)]
        undo: bool,
    },
    /// Remove a todo
    Remove { id: TodoId },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("no user given: pass --user or set NOTEKEEP_USER")]
    MissingUser,

    #[error("Failed to open database: {0}")]
    Open(#[from] StorageError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

type CliResult = Result<(), CliError>;

/// Get the default database path (~/.local/share/notekeep/notekeep.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("notekeep").join("notekeep.db")
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn timestamp(at: DateTime<Utc>) -> String {
    date_format::format(at.with_timezone(&Local).naive_local())
}

/// Prints either JSON or the human-readable rendering
struct Output {
    json: bool,
}

impl Output {
    fn emit<T: Serialize + ?Sized>(&self, value: &T, human: impl FnOnce()) -> CliResult {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human();
        }
        Ok(())
    }

    fn notes(&self, notes: &[Note]) -> CliResult {
        self.emit(notes, || {
            if notes.is_empty() {
                println!("No notes.");
                return;
            }
            println!("{:>6}  {:<32}  {:<3}  {:>16}", "ID", "TITLE", "FLG", "UPDATED");
            println!("{}", "-".repeat(64));
            for note in notes {
                let flags = format!(
                    "{}{}",
                    if note.favorite { "*" } else { "" },
                    if note.archived { "a" } else { "" }
                );
                println!(
                    "{:>6}  {:<32}  {:<3}  {:>16}",
                    note.id,
                    truncate(&note.title, 32),
                    flags,
                    timestamp(note.updated_at)
                );
            }
        })
    }

    fn note(&self, note: &Note) -> CliResult {
        self.emit(note, || {
            println!("#{} {}", note.id, note.title);
            println!(
                "created {}  updated {}",
                timestamp(note.created_at),
                timestamp(note.updated_at)
            );
            if note.favorite || note.archived {
                println!(
                    "favorite: {}  archived: {}",
                    note.favorite, note.archived
                );
            }
            if let Some(notebook) = note.notebook {
                println!("notebook: {}", notebook);
            }
            if !note.tags.is_empty() {
                let names: Vec<_> = note
                    .tags
                    .iter()
                    .map(|t| format!("{} ({})", t.name, t.id))
                    .collect();
                println!("tags: {}", names.join(", "));
            }
            if !note.content.is_empty() {
                println!();
                println!("{}", note.content);
            }
            if !note.todos.is_empty() {
                println!();
                for todo in &note.todos {
                    print_todo(todo);
                }
            }
        })
    }

    fn tags(&self, tags: &[Tag]) -> CliResult {
        self.emit(tags, || {
            if tags.is_empty() {
                println!("No tags.");
            }
            for tag in tags {
                println!("{:>6}  {}", tag.id, tag.name);
            }
        })
    }

    fn notebooks(&self, notebooks: &[Notebook]) -> CliResult {
        self.emit(notebooks, || {
            if notebooks.is_empty() {
                println!("No notebooks.");
            }
            for notebook in notebooks {
                println!(
                    "{:>6}  {:<32}  {}",
                    notebook.id,
                    truncate(&notebook.name, 32),
                    timestamp(notebook.created_at)
                );
            }
        })
    }

    fn todo(&self, todo: &Todo) -> CliResult {
        self.emit(todo, || print_todo(todo))
    }
}

fn print_todo(todo: &Todo) {
    let due = todo
        .due_date
        .map(|d| format!("  due {}", d.format("%d.%m.%Y")))
        .unwrap_or_default();
    println!(
        "[{}] {} (todo {}){}",
        if todo.done { "x" } else { " " },
        todo.title,
        todo.id,
        due
    );
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}

fn cmd_note(api: &NotesApi, me: &UserId, out: &Output, action: NoteAction) -> CliResult {
    let notes = api.notes();
    match action {
        NoteAction::Create {
            title,
            content,
            favorite,
            archived,
            notebook,
            tags,
            todos,
        } => {
            let draft = NewNote {
                title,
                content,
                favorite,
                archived,
                notebook,
                tags: tags.into_iter().collect(),
                todos: todos.into_iter().map(NewTodo::new).collect(),
            };
            out.note(&notes.create_note(me, &draft)?)
        }
        NoteAction::List { favorites, archived } => {
            let listed = if favorites {
                notes.favourite_notes_for_user(me)?
            } else if archived {
                notes.archived_notes_for_user(me)?
            } else {
                notes.notes_for_user(me)?
            };
            out.notes(&listed)
        }
        NoteAction::Show { id } => out.note(&notes.get_note(me, id)?),
        NoteAction::Update {
            id,
            title,
            content,
            favorite,
            archived,
            notebook,
            tags,
            clear_tags,
        } => {
            let current = notes.get_note(me, id)?;
            let mut update = NoteUpdate::from_note(&current);
            if let Some(title) = title {
                update.title = title;
            }
            if let Some(content) = content {
                update.content = content;
            }
            if let Some(favorite) = favorite {
                update.favorite = favorite;
            }
            if let Some(archived) = archived {
                update.archived = archived;
            }
            update.notebook = notebook;
            if clear_tags {
                update = update.with_tags([]);
            } else if !tags.is_empty() {
                update = update.with_tags(tags);
            }
            out.note(&notes.update_note(me, &update)?)
        }
        NoteAction::Delete { id } => {
            notes.delete_note(me, id)?;
            if !out.json {
                println!("Deleted note {}", id);
            }
            Ok(())
        }
    }
}

fn cmd_tag(api: &NotesApi, me: &UserId, out: &Output, action: TagAction) -> CliResult {
    let tags = api.tags();
    match action {
        TagAction::Create { name } => {
            let tag = tags.create_tag(me, &name)?;
            out.tags(std::slice::from_ref(&tag))
        }
        TagAction::List => out.tags(&tags.tags_for_user(me)?),
        TagAction::Notes { id } => out.notes(&tags.notes_for_tag(me, id)?),
        TagAction::Delete { id } => {
            tags.delete_tag(me, id)?;
            if !out.json {
                println!("Deleted tag {}", id);
            }
            Ok(())
        }
    }
}

fn cmd_notebook(api: &NotesApi, me: &UserId, out: &Output, action: NotebookAction) -> CliResult {
    let notebooks = api.notebooks();
    match action {
        NotebookAction::Create { name } => {
            let notebook = notebooks.create_notebook(me, &name)?;
            out.notebooks(std::slice::from_ref(&notebook))
        }
        NotebookAction::List => out.notebooks(&notebooks.notebooks_for_user(me)?),
        NotebookAction::Show { id } => out.notes(&notebooks.notes_in_notebook(me, id)?),
        NotebookAction::Rename { id, name } => {
            let notebook = notebooks.rename_notebook(me, id, &name)?;
            out.notebooks(std::slice::from_ref(&notebook))
        }
        NotebookAction::Delete { id } => {
            notebooks.delete_notebook(me, id)?;
            if !out.json {
                println!("Deleted notebook {}", id);
            }
            Ok(())
        }
    }
}

fn cmd_todo(api: &NotesApi, me: &UserId, out: &Output, action: TodoAction) -> CliResult {
    let notes = api.notes();
    match action {
        TodoAction::Add { note, title, due } => {
            let todo = NewTodo {
                title,
                done: false,
                due_date: due,
            };
            out.todo(&notes.add_todo(me, note, &todo)?)
        }
        TodoAction::Done { id, undo } => out.todo(&notes.set_todo_done(me, id, !undo)?),
        TodoAction::Remove { id } => {
            notes.remove_todo(me, id)?;
            if !out.json {
                println!("Removed todo {}", id);
            }
            Ok(())
        }
    }
}

fn run(cli: Cli) -> CliResult {
    let me = match cli.user.as_deref().map(str::trim) {
        Some(user) if !user.is_empty() => UserId::new(user),
        _ => return Err(CliError::MissingUser),
    };
    let db_path = cli.db.unwrap_or_else(default_db_path);
    let api = NotesApi::open(&db_path)?;
    let out = Output { json: cli.json };

    match cli.command {
        Commands::Note { action } => cmd_note(&api, &me, &out, action),
        Commands::Tag { action } => cmd_tag(&api, &me, &out, action),
        Commands::Notebook { action } => cmd_notebook(&api, &me, &out, action),
        Commands::Todo { action } => cmd_todo(&api, &me, &out, action),
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
