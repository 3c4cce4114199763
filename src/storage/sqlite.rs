//! SQLite storage backend for notekeep

use super::traits::{
    NoteFilter, NoteStore, NotebookStore, OpenStore, StorageError, StorageResult, TagStore,
    TodoStore,
};
use crate::model::{
    NewNote, NewTodo, Note, NoteId, Notebook, NotebookId, Tag, TagId, Todo, TodoId, UserId,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const NOTE_COLUMNS: &str = "n.id, n.title, n.content, n.owner_id, n.favorite, n.archived, \
                            n.notebook_id, n.created_at, n.updated_at";

const TODO_COLUMNS: &str = "id, note_id, title, done, due_date, position";

const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// A `notes` row before tags and todos are attached
struct NoteRow {
    id: i64,
    title: String,
    content: String,
    owner_id: String,
    favorite: bool,
    archived: bool,
    notebook_id: Option<i64>,
    created_at: String,
    updated_at: String,
}

impl NoteRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            owner_id: row.get(3)?,
            favorite: row.get(4)?,
            archived: row.get(5)?,
            notebook_id: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

/// SQLite-backed note store
///
/// Uses a single SQLite database file with tables for notes, tags, the
/// note/tag association, todos and notebooks. Thread-safe via internal mutex
/// on the connection. The note/tag relationship is stored once, in
/// `note_tags`; "notes for a tag" is answered by querying that table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Enable foreign keys (cascades below depend on it)
            PRAGMA foreign_keys = ON;

            -- Enable WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS notebooks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notebooks_owner
                ON notebooks(owner_id);

            CREATE TABLE IF NOT EXISTS notes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                favorite INTEGER NOT NULL DEFAULT 0,
                archived INTEGER NOT NULL DEFAULT 0,
                notebook_id INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (notebook_id) REFERENCES notebooks(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notes_owner_archived
                ON notes(owner_id, archived);
            CREATE INDEX IF NOT EXISTS idx_notes_owner_favorite
                ON notes(owner_id, favorite);

            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                owner_id TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tags_owner
                ON tags(owner_id);

            -- The only record of which note carries which tag
            CREATE TABLE IF NOT EXISTS note_tags (
                note_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (note_id, tag_id),
                FOREIGN KEY (note_id) REFERENCES notes(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_note_tags_tag
                ON note_tags(tag_id);

            CREATE TABLE IF NOT EXISTS todos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                note_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                done INTEGER NOT NULL DEFAULT 0,
                due_date TEXT,
                position INTEGER NOT NULL,
                FOREIGN KEY (note_id) REFERENCES notes(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_todos_note
                ON todos(note_id, position);
            "#,
        )?;

        Ok(())
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn now() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StorageError::DateParse(e.to_string()))
    }

    fn parse_due_date(value: &str) -> StorageResult<NaiveDate> {
        NaiveDate::parse_from_str(value, DUE_DATE_FORMAT)
            .map_err(|e| StorageError::DateParse(e.to_string()))
    }

    fn format_due_date(due: Option<NaiveDate>) -> Option<String> {
        due.map(|d| d.format(DUE_DATE_FORMAT).to_string())
    }

    /// Attach tags and todos to a note row
    fn hydrate(conn: &Connection, row: NoteRow) -> StorageResult<Note> {
        let id = NoteId::from_raw(row.id);
        Ok(Note {
            id,
            title: row.title,
            content: row.content,
            owner: UserId::new(row.owner_id),
            favorite: row.favorite,
            archived: row.archived,
            notebook: row.notebook_id.map(NotebookId::from_raw),
            tags: Self::tags_for_note(conn, id)?,
            todos: Self::todos_for_note(conn, id)?,
            created_at: Self::parse_timestamp(&row.created_at)?,
            updated_at: Self::parse_timestamp(&row.updated_at)?,
        })
    }

    fn load_note_with(conn: &Connection, id: NoteId) -> StorageResult<Option<Note>> {
        let row = conn
            .query_row(
                &format!("SELECT {NOTE_COLUMNS} FROM notes n WHERE n.id = ?1"),
                params![id.get()],
                NoteRow::from_row,
            )
            .optional()?;

        match row {
            Some(row) => Ok(Some(Self::hydrate(conn, row)?)),
            None => Ok(None),
        }
    }

    fn tags_for_note(conn: &Connection, id: NoteId) -> StorageResult<Vec<Tag>> {
        let mut stmt = conn.prepare(
            "SELECT t.id, t.name, t.owner_id
             FROM tags t JOIN note_tags nt ON nt.tag_id = t.id
             WHERE nt.note_id = ?1
             ORDER BY t.id",
        )?;
        let tags = stmt
            .query_map(params![id.get()], Self::row_to_tag)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    fn todos_for_note(conn: &Connection, id: NoteId) -> StorageResult<Vec<Todo>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE note_id = ?1 ORDER BY position, id"
        ))?;
        let rows = stmt
            .query_map(params![id.get()], Self::todo_columns)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::columns_to_todo).collect()
    }

    /// Replace every association of `note_id` with `tags`.
    ///
    /// An id with no matching tag row fails the foreign key, which aborts the
    /// enclosing transaction.
    fn replace_note_tags(
        conn: &Connection,
        note_id: NoteId,
        tags: impl IntoIterator<Item = TagId>,
    ) -> StorageResult<()> {
        conn.execute(
            "DELETE FROM note_tags WHERE note_id = ?1",
            params![note_id.get()],
        )?;

        let mut stmt =
            conn.prepare("INSERT OR IGNORE INTO note_tags (note_id, tag_id) VALUES (?1, ?2)")?;
        for tag in tags {
            stmt.execute(params![note_id.get(), tag.get()])?;
        }

        Ok(())
    }

    /// Append a todo row after the note's current last position
    fn insert_todo_row(conn: &Connection, note_id: NoteId, todo: &NewTodo) -> StorageResult<TodoId> {
        conn.execute(
            r#"
            INSERT INTO todos (note_id, title, done, due_date, position)
            VALUES (?1, ?2, ?3, ?4,
                    (SELECT COALESCE(MAX(position) + 1, 0) FROM todos WHERE note_id = ?1))
            "#,
            params![
                note_id.get(),
                todo.title,
                todo.done,
                Self::format_due_date(todo.due_date),
            ],
        )?;
        Ok(TodoId::from_raw(conn.last_insert_rowid()))
    }

    fn load_todo_with(conn: &Connection, id: TodoId) -> StorageResult<Option<Todo>> {
        let columns = conn
            .query_row(
                &format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1"),
                params![id.get()],
                Self::todo_columns,
            )
            .optional()?;

        columns.map(Self::columns_to_todo).transpose()
    }

    #[allow(clippy::type_complexity)]
    fn todo_columns(row: &Row<'_>) -> rusqlite::Result<(i64, i64, String, bool, Option<String>, i64)> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    }

    fn columns_to_todo(
        (id, note_id, title, done, due_date, position): (i64, i64, String, bool, Option<String>, i64),
    ) -> StorageResult<Todo> {
        Ok(Todo {
            id: TodoId::from_raw(id),
            note_id: NoteId::from_raw(note_id),
            title,
            done,
            due_date: due_date.as_deref().map(Self::parse_due_date).transpose()?,
            position,
        })
    }

    fn row_to_tag(row: &Row<'_>) -> rusqlite::Result<Tag> {
        Ok(Tag {
            id: TagId::from_raw(row.get(0)?),
            name: row.get(1)?,
            owner: UserId::new(row.get::<_, String>(2)?),
        })
    }

    fn row_to_notebook(
        (id, name, owner_id, created_at): (i64, String, String, String),
    ) -> StorageResult<Notebook> {
        Ok(Notebook {
            id: NotebookId::from_raw(id),
            name,
            owner: UserId::new(owner_id),
            created_at: Self::parse_timestamp(&created_at)?,
        })
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl NoteStore for SqliteStore {
    fn insert_note(&self, owner: &UserId, note: &NewNote) -> StorageResult<Note> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = Self::now();

        tx.execute(
            r#"
            INSERT INTO notes (title, content, owner_id, favorite, archived, notebook_id,
                               created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
            params![
                note.title,
                note.content,
                owner.as_str(),
                note.favorite,
                note.archived,
                note.notebook.map(NotebookId::get),
                now,
            ],
        )?;
        let id = NoteId::from_raw(tx.last_insert_rowid());

        Self::replace_note_tags(&tx, id, note.tags.iter().copied())?;
        for todo in &note.todos {
            Self::insert_todo_row(&tx, id, todo)?;
        }

        let saved = Self::load_note_with(&tx, id)?.ok_or(StorageError::NoteNotFound(id))?;
        tx.commit()?;

        Ok(saved)
    }

    fn save_note(&self, note: &Note) -> StorageResult<Note> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let rows = tx.execute(
            r#"
            UPDATE notes SET
                title = ?2,
                content = ?3,
                favorite = ?4,
                archived = ?5,
                notebook_id = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
            params![
                note.id.get(),
                note.title,
                note.content,
                note.favorite,
                note.archived,
                note.notebook.map(NotebookId::get),
                Self::now(),
            ],
        )?;
        if rows == 0 {
            return Err(StorageError::NoteNotFound(note.id));
        }

        Self::replace_note_tags(&tx, note.id, note.tags.iter().map(|t| t.id))?;

        let saved = Self::load_note_with(&tx, note.id)?.ok_or(StorageError::NoteNotFound(note.id))?;
        tx.commit()?;

        Ok(saved)
    }

    fn load_note(&self, id: NoteId) -> StorageResult<Option<Note>> {
        let conn = self.conn()?;
        Self::load_note_with(&conn, id)
    }

    fn find_notes(&self, filter: &NoteFilter) -> StorageResult<Vec<Note>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {NOTE_COLUMNS} FROM notes n WHERE 1 = 1");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref owner) = filter.owner {
            sql.push_str(" AND n.owner_id = ?");
            params_vec.push(Box::new(owner.as_str().to_string()));
        }

        if let Some(archived) = filter.archived {
            sql.push_str(" AND n.archived = ?");
            params_vec.push(Box::new(archived));
        }

        if let Some(favorite) = filter.favorite {
            sql.push_str(" AND n.favorite = ?");
            params_vec.push(Box::new(favorite));
        }

        if let Some(tag) = filter.tag {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM note_tags nt WHERE nt.note_id = n.id AND nt.tag_id = ?)",
            );
            params_vec.push(Box::new(tag.get()));
        }

        if let Some(notebook) = filter.notebook {
            sql.push_str(" AND n.notebook_id = ?");
            params_vec.push(Box::new(notebook.get()));
        }

        sql.push_str(" ORDER BY n.id");

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|b| b.as_ref()).collect();
        let rows = stmt
            .query_map(params_refs.as_slice(), NoteRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|row| Self::hydrate(&conn, row))
            .collect()
    }

    fn delete_note(&self, id: NoteId) -> StorageResult<bool> {
        let conn = self.conn()?;
        // todos and note_tags go with it via ON DELETE CASCADE
        let rows = conn.execute("DELETE FROM notes WHERE id = ?1", params![id.get()])?;
        Ok(rows > 0)
    }
}

impl TodoStore for SqliteStore {
    fn insert_todo(&self, note_id: NoteId, todo: &NewTodo) -> StorageResult<Todo> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let id = Self::insert_todo_row(&tx, note_id, todo)?;
        let saved = Self::load_todo_with(&tx, id)?.ok_or(StorageError::TodoNotFound(id))?;
        tx.commit()?;

        Ok(saved)
    }

    fn load_todo(&self, id: TodoId) -> StorageResult<Option<Todo>> {
        let conn = self.conn()?;
        Self::load_todo_with(&conn, id)
    }

    fn save_todo(&self, todo: &Todo) -> StorageResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE todos SET title = ?2, done = ?3, due_date = ?4 WHERE id = ?1",
            params![
                todo.id.get(),
                todo.title,
                todo.done,
                Self::format_due_date(todo.due_date),
            ],
        )?;
        if rows == 0 {
            return Err(StorageError::TodoNotFound(todo.id));
        }
        Ok(())
    }

    fn delete_todo(&self, id: TodoId) -> StorageResult<bool> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM todos WHERE id = ?1", params![id.get()])?;
        Ok(rows > 0)
    }

    fn count_todos(&self, note_id: NoteId) -> StorageResult<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM todos WHERE note_id = ?1",
            params![note_id.get()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl TagStore for SqliteStore {
    fn insert_tag(&self, owner: &UserId, name: &str) -> StorageResult<Tag> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO tags (name, owner_id) VALUES (?1, ?2)",
            params![name, owner.as_str()],
        )?;

        Ok(Tag {
            id: TagId::from_raw(conn.last_insert_rowid()),
            name: name.to_string(),
            owner: owner.clone(),
        })
    }

    fn load_tag(&self, id: TagId) -> StorageResult<Option<Tag>> {
        let conn = self.conn()?;
        let tag = conn
            .query_row(
                "SELECT id, name, owner_id FROM tags WHERE id = ?1",
                params![id.get()],
                Self::row_to_tag,
            )
            .optional()?;
        Ok(tag)
    }

    fn find_tags(&self, owner: &UserId) -> StorageResult<Vec<Tag>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, owner_id FROM tags WHERE owner_id = ?1 ORDER BY id")?;
        let tags = stmt
            .query_map(params![owner.as_str()], Self::row_to_tag)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    fn delete_tag(&self, id: TagId) -> StorageResult<bool> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM tags WHERE id = ?1", params![id.get()])?;
        Ok(rows > 0)
    }
}

impl NotebookStore for SqliteStore {
    fn insert_notebook(&self, owner: &UserId, name: &str) -> StorageResult<Notebook> {
        let conn = self.conn()?;
        let now = Self::now();
        conn.execute(
            "INSERT INTO notebooks (name, owner_id, created_at) VALUES (?1, ?2, ?3)",
            params![name, owner.as_str(), now],
        )?;

        Ok(Notebook {
            id: NotebookId::from_raw(conn.last_insert_rowid()),
            name: name.to_string(),
            owner: owner.clone(),
            created_at: Self::parse_timestamp(&now)?,
        })
    }

    fn load_notebook(&self, id: NotebookId) -> StorageResult<Option<Notebook>> {
        let conn = self.conn()?;
        let row: Option<(i64, String, String, String)> = conn
            .query_row(
                "SELECT id, name, owner_id, created_at FROM notebooks WHERE id = ?1",
                params![id.get()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        row.map(Self::row_to_notebook).transpose()
    }

    fn find_notebooks(&self, owner: &UserId) -> StorageResult<Vec<Notebook>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, owner_id, created_at FROM notebooks WHERE owner_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![owner.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<Result<Vec<(i64, String, String, String)>, _>>()?;

        rows.into_iter().map(Self::row_to_notebook).collect()
    }

    fn save_notebook(&self, notebook: &Notebook) -> StorageResult<()> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE notebooks SET name = ?2 WHERE id = ?1",
            params![notebook.id.get(), notebook.name],
        )?;
        if rows == 0 {
            return Err(StorageError::NotebookNotFound(notebook.id));
        }
        Ok(())
    }

    fn delete_notebook(&self, id: NotebookId) -> StorageResult<bool> {
        let conn = self.conn()?;
        // notes.notebook_id is cleared via ON DELETE SET NULL
        let rows = conn.execute("DELETE FROM notebooks WHERE id = ?1", params![id.get()])?;
        Ok(rows > 0)
    }
}
