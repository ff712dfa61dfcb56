mod embedded;

use embedded::migrations;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, ffi, params};

use crate::models::Note;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("a note with this title already exists")]
    UniqueViolation,

    #[error("failed to migrate database: {0}")]
    Migration(#[from] refinery::Error),

    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(ref err, _)
                if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Self::UniqueViolation
            }
            e => Self::Sqlite(e),
        }
    }
}

pub struct Repository {
    conn: Connection,
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
    })
}

impl Repository {
    /// Opens the database file at `database_path`, creating it if needed.
    /// `:memory:` opens a private in-memory database.
    pub fn new(database_path: &str) -> Result<Self, RepositoryError> {
        let conn = Connection::open(database_path)?;
        tracing::debug!("opened sqlite database at {}", database_path);

        Ok(Self { conn })
    }

    pub fn migrate(&mut self) -> Result<(), RepositoryError> {
        let migrations_report = migrations::runner().run(&mut self.conn)?;

        for migration in migrations_report.applied_migrations() {
            tracing::info!(
                "Migration Applied -  Name: {}, Version: {}",
                migration.name(),
                migration.version()
            );
        }

        tracing::info!("DB migrations finished!");

        Ok(())
    }

    pub fn create_note(&self, title: &str, content: &str) -> Result<Note, RepositoryError> {
        let note = self.conn.query_row(
            "INSERT INTO note (title, content, created_at) VALUES (?1, ?2, ?3) \
             RETURNING id, title, content, created_at",
            params![title, content, Utc::now()],
            note_from_row,
        )?;

        Ok(note)
    }

    /// Replaces whichever of `title` and `content` is `Some` and always
    /// refreshes `created_at`.
    pub fn update_note(
        &self,
        id: i64,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<Note>, RepositoryError> {
        let note = self
            .conn
            .query_row(
                "UPDATE note SET title = COALESCE(?1, title), content = COALESCE(?2, content), \
                 created_at = ?3 WHERE id = ?4 RETURNING id, title, content, created_at",
                params![title, content, Utc::now(), id],
                note_from_row,
            )
            .optional()?;

        Ok(note)
    }

    /// Returns the removed row as it was just before deletion.
    pub fn delete_note(&self, id: i64) -> Result<Option<Note>, RepositoryError> {
        let note = self
            .conn
            .query_row(
                "DELETE FROM note WHERE id = ?1 RETURNING id, title, content, created_at",
                params![id],
                note_from_row,
            )
            .optional()?;

        Ok(note)
    }

    pub fn get_one_note(&self, id: i64) -> Result<Option<Note>, RepositoryError> {
        let note = self
            .conn
            .query_row(
                "SELECT id, title, content, created_at FROM note WHERE id = ?1",
                params![id],
                note_from_row,
            )
            .optional()?;

        Ok(note)
    }

    pub fn get_all_notes(&self) -> Result<Vec<Note>, RepositoryError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, content, created_at FROM note ORDER BY id")?;

        let notes = stmt
            .query_map([], note_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> Repository {
        let mut repo = Repository::new(":memory:").unwrap();
        repo.migrate().unwrap();
        repo
    }

    #[test]
    fn create_assigns_sequential_ids_and_timestamp() {
        let repo = repo();
        let before = Utc::now();

        let first = repo.create_note("first", "one").unwrap();
        let second = repo.create_note("second", "two").unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.title, "first");
        assert_eq!(first.content, "one");
        assert!(first.created_at >= before);
        assert!(first.created_at <= Utc::now());
    }

    #[test]
    fn duplicate_title_is_a_unique_violation() {
        let repo = repo();
        repo.create_note("A", "x").unwrap();

        let err = repo.create_note("A", "y").unwrap_err();

        assert!(matches!(err, RepositoryError::UniqueViolation));
        let notes = repo.get_all_notes().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].content, "x");
    }

    #[test]
    fn update_applies_only_given_fields_and_refreshes_timestamp() {
        let repo = repo();
        let created = repo.create_note("title", "old").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));

        let updated = repo
            .update_note(created.id, None, Some("new"))
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.title, "title");
        assert_eq!(updated.content, "new");
        assert!(updated.created_at > created.created_at);
    }

    #[test]
    fn update_to_taken_title_is_rejected() {
        let repo = repo();
        repo.create_note("one", "1").unwrap();
        let two = repo.create_note("two", "2").unwrap();

        let err = repo.update_note(two.id, Some("one"), None).unwrap_err();

        assert!(matches!(err, RepositoryError::UniqueViolation));
        assert_eq!(repo.get_one_note(two.id).unwrap().unwrap().title, "two");
    }

    #[test]
    fn missing_rows_yield_none() {
        let repo = repo();

        assert!(repo.get_one_note(42).unwrap().is_none());
        assert!(repo.update_note(42, Some("t"), None).unwrap().is_none());
        assert!(repo.delete_note(42).unwrap().is_none());
    }

    #[test]
    fn delete_returns_prior_state_and_ids_are_not_reused() {
        let repo = repo();
        let created = repo.create_note("gone", "soon").unwrap();

        let deleted = repo.delete_note(created.id).unwrap().unwrap();
        assert_eq!(deleted, created);
        assert!(repo.get_one_note(created.id).unwrap().is_none());

        let next = repo.create_note("gone", "again").unwrap();
        assert!(next.id > created.id);
    }

    #[test]
    fn schema_persists_in_file_backed_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");
        let path = path.to_str().unwrap();

        {
            let mut repo = Repository::new(path).unwrap();
            repo.migrate().unwrap();
            repo.create_note("kept", "on disk").unwrap();
        }

        let mut reopened = Repository::new(path).unwrap();
        reopened.migrate().unwrap();
        let notes = reopened.get_all_notes().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "kept");
    }
}
