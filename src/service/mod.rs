use crate::{
    dto::{CreateNoteRequest, NoteResponse, UpdateNoteRequest},
    repository::{Repository, RepositoryError},
};

use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum NoteServiceError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Note not found")]
    NotFound,

    #[error("Note with this title already exists")]
    Conflict,

    #[error("storage failure: {0}")]
    Repository(#[source] RepositoryError),
}

impl From<RepositoryError> for NoteServiceError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::UniqueViolation => Self::Conflict,
            e => Self::Repository(e),
        }
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, NoteServiceError> {
    value.ok_or(NoteServiceError::MissingField(field))
}

/// Empty strings in a patch mean "leave as is".
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct NoteService {
    repo: Arc<tokio::sync::Mutex<Repository>>,
}

impl NoteService {
    pub const fn new(repo: Arc<tokio::sync::Mutex<Repository>>) -> Self {
        Self { repo }
    }

    pub async fn create_note(
        &self,
        request: CreateNoteRequest,
    ) -> Result<NoteResponse, NoteServiceError> {
        let title = required(request.title, "title")?;
        let content = required(request.content, "content")?;

        let note = self.repo.lock().await.create_note(&title, &content)?;

        tracing::debug!("created note {} with title '{}'", note.id, note.title);

        Ok(note.into())
    }

    pub async fn update_note(
        &self,
        id: i64,
        request: UpdateNoteRequest,
    ) -> Result<NoteResponse, NoteServiceError> {
        self.repo
            .lock()
            .await
            .update_note(
                id,
                non_empty(request.title.as_deref()),
                non_empty(request.content.as_deref()),
            )?
            .map(Into::into)
            .ok_or(NoteServiceError::NotFound)
    }

    pub async fn delete_note(&self, id: i64) -> Result<NoteResponse, NoteServiceError> {
        self.repo
            .lock()
            .await
            .delete_note(id)?
            .map(Into::into)
            .ok_or(NoteServiceError::NotFound)
    }

    pub async fn get_one_note(&self, id: i64) -> Result<NoteResponse, NoteServiceError> {
        self.repo
            .lock()
            .await
            .get_one_note(id)?
            .map(Into::into)
            .ok_or(NoteServiceError::NotFound)
    }

    pub async fn get_all_notes(&self) -> Result<Vec<NoteResponse>, NoteServiceError> {
        let notes = self.repo.lock().await.get_all_notes()?;

        Ok(notes.into_iter().map(Into::into).collect())
    }
}
